// Telemetry data domain models
use serde::Serialize;
use serde_json::Value;

/// One bucket of a historical series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplePoint {
    pub value: f64,
    pub timestamp_seconds: i64,
}

impl SamplePoint {
    pub fn new(timestamp_seconds: i64, value: f64) -> Self {
        Self {
            value,
            timestamp_seconds,
        }
    }

    /// Ingest an upstream `[timestamp, value]` pair. Values that do not
    /// read as a number become `0`.
    pub fn from_raw(timestamp_seconds: i64, raw: &Value) -> Self {
        let value = coerce_number(raw).map(round2).unwrap_or(0.0);
        Self::new(timestamp_seconds, value)
    }
}

/// Points in ascending timestamp order, as delivered upstream.
pub type Series = Vec<SamplePoint>;

/// Last applied instantaneous reading for a channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveValue {
    pub channel_id: String,
    pub value: f64,
    pub fetched_at_ms: i64,
}

impl LiveValue {
    pub fn new(channel_id: String, value: f64, fetched_at_ms: i64) -> Self {
        Self {
            channel_id,
            value,
            fetched_at_ms,
        }
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Numbers and numeric strings read as `f64`; anything else, including
/// non-finite results, is rejected.
pub fn coerce_number(raw: &Value) -> Option<f64> {
    let number = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_rounding() {
        let point = SamplePoint::from_raw(1_700_000_000, &json!(12.3456));
        assert_eq!(point.value, 12.35);
        assert_eq!(point.timestamp_seconds, 1_700_000_000);

        assert_eq!(SamplePoint::from_raw(0, &json!(-3.001)).value, -3.0);
        assert_eq!(SamplePoint::from_raw(0, &json!(7)).value, 7.0);
    }

    #[test]
    fn test_invalid_values_coerce_to_zero() {
        assert_eq!(SamplePoint::from_raw(0, &json!(null)).value, 0.0);
        assert_eq!(SamplePoint::from_raw(0, &json!("n/a")).value, 0.0);
        assert_eq!(SamplePoint::from_raw(0, &json!({"v": 1})).value, 0.0);
        assert_eq!(SamplePoint::from_raw(0, &json!(" 4.567 ")).value, 4.57);
    }

    #[test]
    fn test_coerce_number_rejects_non_finite() {
        assert_eq!(coerce_number(&json!("inf")), None);
        assert_eq!(coerce_number(&json!("NaN")), None);
        assert_eq!(coerce_number(&json!(true)), None);
        assert_eq!(coerce_number(&json!("230.5")), Some(230.5));
    }
}
