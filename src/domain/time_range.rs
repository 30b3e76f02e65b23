// Time range catalog and x-axis label formatting
use super::error::DashboardError;
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Selectable history windows. `Day` is the default (shortest) window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl TimeRange {
    pub const ALL: [TimeRange; 4] = [
        TimeRange::Day,
        TimeRange::Week,
        TimeRange::Month,
        TimeRange::Year,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TimeRange::Day => "Day",
            TimeRange::Week => "Week",
            TimeRange::Month => "Month",
            TimeRange::Year => "Year",
        }
    }

    pub fn duration_seconds(self) -> i64 {
        match self {
            TimeRange::Day => 86_400,
            TimeRange::Week => 7 * 86_400,
            TimeRange::Month => 30 * 86_400,
            TimeRange::Year => 365 * 86_400,
        }
    }

    /// Downsampling interval requested from the historical endpoint.
    pub fn bucket_interval_seconds(self) -> i64 {
        match self {
            TimeRange::Day => 120,
            TimeRange::Week => 900,
            TimeRange::Month => 3_600,
            TimeRange::Year => 86_400,
        }
    }

    /// Case-insensitive lookup by label.
    pub fn from_label(label: &str) -> Result<Self, DashboardError> {
        Self::ALL
            .into_iter()
            .find(|range| range.label().eq_ignore_ascii_case(label.trim()))
            .ok_or_else(|| DashboardError::UnknownRange(label.to_string()))
    }
}

/// Step that fetch windows end on, independent of the range.
pub const WINDOW_ALIGNMENT_MS: i64 = 60_000;

/// Round `now_ms` down to the previous whole minute, so repeated fetches
/// within one minute produce the same window.
pub fn align_window_end(now_ms: i64) -> i64 {
    now_ms - now_ms.rem_euclid(WINDOW_ALIGNMENT_MS)
}

/// Label for a point on the x-axis, in local time.
pub fn format_axis_label(timestamp_seconds: i64, range: TimeRange) -> String {
    format_axis_label_in(timestamp_seconds, range, &Local)
}

pub fn format_axis_label_in<Tz>(timestamp_seconds: i64, range: TimeRange, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let Some(instant) = DateTime::<Utc>::from_timestamp(timestamp_seconds, 0) else {
        return String::new();
    };

    let pattern = match range {
        TimeRange::Day => "%H:%M",
        TimeRange::Week => "%-d/%-m %-H:00",
        TimeRange::Month => "%-d/%-m",
        TimeRange::Year => "%b",
    };

    instant.with_timezone(tz).format(pattern).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // 2023-11-14 22:13:20 UTC
    const AUTUMN: i64 = 1_700_000_000;
    // 2024-01-01 01:00:00 UTC
    const NEW_YEAR: i64 = 1_704_070_800;

    #[test]
    fn test_format_axis_label() {
        assert_eq!(format_axis_label_in(AUTUMN, TimeRange::Day, &Utc), "22:13");
        assert_eq!(format_axis_label_in(AUTUMN, TimeRange::Week, &Utc), "14/11 22:00");
        assert_eq!(format_axis_label_in(AUTUMN, TimeRange::Month, &Utc), "14/11");
        assert_eq!(format_axis_label_in(AUTUMN, TimeRange::Year, &Utc), "Nov");

        assert_eq!(format_axis_label_in(NEW_YEAR, TimeRange::Day, &Utc), "01:00");
        assert_eq!(format_axis_label_in(NEW_YEAR, TimeRange::Week, &Utc), "1/1 1:00");
        assert_eq!(format_axis_label_in(NEW_YEAR, TimeRange::Month, &Utc), "1/1");
        assert_eq!(format_axis_label_in(NEW_YEAR, TimeRange::Year, &Utc), "Jan");
    }

    #[test]
    fn test_catalog() {
        assert_eq!(TimeRange::default(), TimeRange::Day);
        assert_eq!(TimeRange::Day.duration_seconds(), 86_400);
        assert_eq!(TimeRange::Day.bucket_interval_seconds(), 120);

        let shortest = TimeRange::ALL
            .into_iter()
            .min_by_key(|r| r.duration_seconds());
        assert_eq!(shortest, Some(TimeRange::default()));

        assert_eq!(TimeRange::from_label("week"), Ok(TimeRange::Week));
        assert_eq!(TimeRange::from_label(" Year "), Ok(TimeRange::Year));
        assert_eq!(
            TimeRange::from_label("Decade"),
            Err(DashboardError::UnknownRange("Decade".to_string()))
        );
    }

    #[test]
    fn test_align_window_end() {
        assert_eq!(align_window_end(240_000), 240_000);
        assert_eq!(align_window_end(299_999), 240_000);
        assert_eq!(align_window_end(300_000), 300_000);
        assert_eq!(align_window_end(-1), -60_000);
    }

    proptest! {
        #[test]
        fn prop_format_axis_label_is_pure(
            timestamp in 0i64..4_102_444_800,
            range in prop::sample::select(TimeRange::ALL.to_vec()),
        ) {
            prop_assert_eq!(format_axis_label(timestamp, range), format_axis_label(timestamp, range));
            prop_assert_eq!(
                format_axis_label_in(timestamp, range, &Utc),
                format_axis_label_in(timestamp, range, &Utc)
            );
        }

        #[test]
        fn prop_window_end_is_stable_within_a_minute(now_ms in 0i64..4_102_444_800_000) {
            let end = align_window_end(now_ms);
            prop_assert!(end <= now_ms);
            prop_assert!(now_ms - end < WINDOW_ALIGNMENT_MS);
            prop_assert_eq!(align_window_end(end + WINDOW_ALIGNMENT_MS - 1), end);
        }
    }
}
