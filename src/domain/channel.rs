// Channel domain model
use super::error::DashboardError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One monitored feed, e.g. a current or power sensor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
}

impl Channel {
    #[cfg(test)]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DashboardKind {
    /// Line charts over a selectable time range.
    #[default]
    TimeSeries,
    /// Bar and radial gauges fed only by live values.
    Balance,
}

impl DashboardKind {
    pub fn fetches_history(self) -> bool {
        matches!(self, DashboardKind::TimeSeries)
    }
}

/// Reject channel lists no round could sensibly run against.
pub fn validate_channels(channels: &[Channel]) -> Result<(), DashboardError> {
    if channels.is_empty() {
        return Err(DashboardError::NoChannels);
    }

    let mut seen = HashSet::with_capacity(channels.len());
    for (position, channel) in channels.iter().enumerate() {
        if channel.id.trim().is_empty() {
            return Err(DashboardError::BlankChannelId(position));
        }
        if !seen.insert(channel.id.as_str()) {
            return Err(DashboardError::DuplicateChannel(channel.id.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_channels() {
        let channels = vec![Channel::new("1", "Mains"), Channel::new("2", "Solar")];
        assert_eq!(validate_channels(&channels), Ok(()));

        assert_eq!(validate_channels(&[]), Err(DashboardError::NoChannels));

        let blank = vec![Channel::new("1", "Mains"), Channel::new("  ", "Nameless")];
        assert_eq!(
            validate_channels(&blank),
            Err(DashboardError::BlankChannelId(1))
        );

        let duplicate = vec![Channel::new("7", "A"), Channel::new("7", "B")];
        assert_eq!(
            validate_channels(&duplicate),
            Err(DashboardError::DuplicateChannel("7".to_string()))
        );
    }

    #[test]
    fn test_balance_never_fetches_history() {
        assert!(DashboardKind::TimeSeries.fetches_history());
        assert!(!DashboardKind::Balance.fetches_history());
    }
}
