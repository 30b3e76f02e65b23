// Session-scoped memoization of historical series
use crate::domain::telemetry::Series;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// A fetch window, fully determined by its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub channel_id: String,
    pub window_start_ms: i64,
    pub window_end_ms: i64,
    pub bucket_interval_seconds: i64,
}

impl CacheKey {
    pub fn new(
        channel_id: &str,
        window_start_ms: i64,
        window_end_ms: i64,
        bucket_interval_seconds: i64,
    ) -> Self {
        Self {
            channel_id: channel_id.to_string(),
            window_start_ms,
            window_end_ms,
            bucket_interval_seconds,
        }
    }
}

/// Unbounded and never expiring; dropped together with its session.
#[derive(Debug, Default)]
pub struct SeriesCache {
    entries: RwLock<HashMap<CacheKey, Series>>,
}

impl SeriesCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Series> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn put(&self, key: CacheKey, series: Series) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, series);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
