// Repository trait for the remote metering API
use async_trait::async_trait;
use serde_json::Value;

/// An upstream `[timestamp, value]` row before coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    pub timestamp_seconds: i64,
    pub value: Value,
}

impl RawSample {
    pub fn new(timestamp_seconds: i64, value: Value) -> Self {
        Self {
            timestamp_seconds,
            value,
        }
    }
}

#[async_trait]
pub trait MeteringRepository: Send + Sync {
    /// Bucketed history for one channel between two millisecond bounds.
    async fn fetch_history(
        &self,
        channel_id: &str,
        start_ms: i64,
        end_ms: i64,
        interval_seconds: i64,
    ) -> anyhow::Result<Vec<RawSample>>;

    /// Present value of one channel.
    async fn fetch_live(&self, channel_id: &str) -> anyhow::Result<f64>;
}
