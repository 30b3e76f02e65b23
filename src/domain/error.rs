// Session-level error taxonomy
use thiserror::Error;

/// Failures that abort a whole round instead of a single channel.
///
/// Per-channel request failures never surface here: the fetcher and poller
/// log them and substitute an empty series or a zero reading.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DashboardError {
    #[error("dashboard has no channels")]
    NoChannels,

    #[error("channel at position {0} has an empty id")]
    BlankChannelId(usize),

    #[error("channel id {0:?} appears more than once")]
    DuplicateChannel(String),

    #[error("unknown time range {0:?}")]
    UnknownRange(String),

    #[error("{0} is not a selectable fixed scale")]
    InvalidFixedScale(f64),
}
