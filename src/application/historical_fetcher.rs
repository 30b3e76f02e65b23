// Historical fetcher - Bucketed series per channel, memoized per window
use crate::application::metering_repository::MeteringRepository;
use crate::application::series_cache::{CacheKey, SeriesCache};
use crate::domain::channel::{Channel, validate_channels};
use crate::domain::error::DashboardError;
use crate::domain::telemetry::{SamplePoint, Series};
use crate::domain::time_range::TimeRange;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct HistoricalFetcher {
    repository: Arc<dyn MeteringRepository>,
    cache: Arc<SeriesCache>,
    request_timeout: Duration,
}

impl HistoricalFetcher {
    pub fn new(
        repository: Arc<dyn MeteringRepository>,
        cache: Arc<SeriesCache>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            cache,
            request_timeout,
        }
    }

    #[cfg(test)]
    pub fn cache(&self) -> &Arc<SeriesCache> {
        &self.cache
    }

    /// Fetch `range` ending at `now_ms` for every channel.
    ///
    /// Resolves once every channel has settled. A channel whose request fails
    /// or times out maps to an empty series; only a malformed channel list
    /// fails the whole round.
    pub async fn fetch(
        &self,
        channels: &[Channel],
        range: TimeRange,
        now_ms: i64,
    ) -> Result<HashMap<String, Series>, DashboardError> {
        validate_channels(channels)?;

        let window_end_ms = now_ms;
        let window_start_ms = now_ms - range.duration_seconds() * 1_000;

        let rounds = channels.iter().map(|channel| {
            let key = CacheKey::new(
                &channel.id,
                window_start_ms,
                window_end_ms,
                range.bucket_interval_seconds(),
            );
            self.fetch_channel(key)
        });
        let settled = join_all(rounds).await;

        Ok(channels
            .iter()
            .map(|c| c.id.clone())
            .zip(settled)
            .collect())
    }

    async fn fetch_channel(&self, key: CacheKey) -> Series {
        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!(channel = %key.channel_id, points = cached.len(), "series cache hit");
            return cached;
        }

        let request = self.repository.fetch_history(
            &key.channel_id,
            key.window_start_ms,
            key.window_end_ms,
            key.bucket_interval_seconds,
        );

        match tokio::time::timeout(self.request_timeout, request).await {
            Ok(Ok(rows)) => {
                let series: Series = rows
                    .iter()
                    .map(|row| SamplePoint::from_raw(row.timestamp_seconds, &row.value))
                    .collect();
                tracing::debug!(channel = %key.channel_id, points = series.len(), "fetched series");
                self.cache.put(key, series.clone());
                series
            }
            Ok(Err(e)) => {
                tracing::warn!(channel = %key.channel_id, error = %e, "historical fetch failed");
                Series::new()
            }
            Err(_) => {
                tracing::warn!(
                    channel = %key.channel_id,
                    timeout_ms = self.request_timeout.as_millis() as u64,
                    "historical fetch timed out"
                );
                Series::new()
            }
        }
    }
}
