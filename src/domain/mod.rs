// Domain layer - Pure types and state transitions
pub mod channel;
pub mod dashboard;
pub mod error;
pub mod scale;
pub mod telemetry;
pub mod time_range;
pub mod zoom;
