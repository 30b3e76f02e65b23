// Scripted metering repository and clock for tests
use crate::application::dashboard_session::Clock;
use crate::application::metering_repository::{MeteringRepository, RawSample};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum HistoryReply {
    Points(Vec<RawSample>),
    Delayed(Duration, Vec<RawSample>),
    Fail,
    Hang,
}

#[derive(Debug, Clone)]
pub enum LiveReply {
    Value(f64),
    Fail,
    Delayed(Duration, f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryCall {
    pub channel_id: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub interval_seconds: i64,
}

/// Unscripted channels return an empty history and a live value of `0`.
#[derive(Debug, Default)]
pub struct FakeMeteringRepository {
    history: Mutex<HashMap<String, HistoryReply>>,
    history_by_interval: Mutex<HashMap<(String, i64), HistoryReply>>,
    live: Mutex<HashMap<String, VecDeque<LiveReply>>>,
    history_calls: Mutex<Vec<HistoryCall>>,
    live_calls: AtomicUsize,
}

impl FakeMeteringRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(self, channel_id: &str, reply: HistoryReply) -> Self {
        self.history
            .lock()
            .unwrap()
            .insert(channel_id.to_string(), reply);
        self
    }

    /// Overrides `with_history` for one bucket interval only.
    pub fn with_history_for(self, channel_id: &str, interval_seconds: i64, reply: HistoryReply) -> Self {
        self.history_by_interval
            .lock()
            .unwrap()
            .insert((channel_id.to_string(), interval_seconds), reply);
        self
    }

    /// Replies are consumed in order; the last one repeats.
    pub fn with_live(self, channel_id: &str, replies: Vec<LiveReply>) -> Self {
        self.live
            .lock()
            .unwrap()
            .insert(channel_id.to_string(), replies.into());
        self
    }

    pub fn history_calls(&self) -> Vec<HistoryCall> {
        self.history_calls.lock().unwrap().clone()
    }

    pub fn live_calls(&self) -> usize {
        self.live_calls.load(Ordering::SeqCst)
    }

    fn next_live(&self, channel_id: &str) -> LiveReply {
        let mut live = self.live.lock().unwrap();
        match live.get_mut(channel_id) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or(LiveReply::Value(0.0)),
            None => LiveReply::Value(0.0),
        }
    }
}

pub fn points(rows: &[(i64, f64)]) -> HistoryReply {
    HistoryReply::Points(raw_samples(rows))
}

pub fn delayed_points(delay: Duration, rows: &[(i64, f64)]) -> HistoryReply {
    HistoryReply::Delayed(delay, raw_samples(rows))
}

fn raw_samples(rows: &[(i64, f64)]) -> Vec<RawSample> {
    rows.iter()
        .map(|(ts, v)| RawSample::new(*ts, serde_json::json!(v)))
        .collect()
}

#[async_trait]
impl MeteringRepository for FakeMeteringRepository {
    async fn fetch_history(
        &self,
        channel_id: &str,
        start_ms: i64,
        end_ms: i64,
        interval_seconds: i64,
    ) -> anyhow::Result<Vec<RawSample>> {
        self.history_calls.lock().unwrap().push(HistoryCall {
            channel_id: channel_id.to_string(),
            start_ms,
            end_ms,
            interval_seconds,
        });

        let by_interval = self
            .history_by_interval
            .lock()
            .unwrap()
            .get(&(channel_id.to_string(), interval_seconds))
            .cloned();
        let reply = by_interval.or_else(|| self.history.lock().unwrap().get(channel_id).cloned());
        match reply {
            Some(HistoryReply::Points(rows)) => Ok(rows),
            Some(HistoryReply::Delayed(delay, rows)) => {
                tokio::time::sleep(delay).await;
                Ok(rows)
            }
            Some(HistoryReply::Fail) => anyhow::bail!("upstream refused channel {channel_id}"),
            Some(HistoryReply::Hang) => futures::future::pending().await,
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_live(&self, channel_id: &str) -> anyhow::Result<f64> {
        self.live_calls.fetch_add(1, Ordering::SeqCst);
        match self.next_live(channel_id) {
            LiveReply::Value(v) => Ok(v),
            LiveReply::Fail => anyhow::bail!("live read failed for channel {channel_id}"),
            LiveReply::Delayed(delay, v) => {
                tokio::time::sleep(delay).await;
                Ok(v)
            }
        }
    }
}

#[derive(Debug)]
pub struct FixedClock(AtomicI64);

impl FixedClock {
    pub fn new(now_ms: i64) -> Self {
        Self(AtomicI64::new(now_ms))
    }

    pub fn set(&self, now_ms: i64) {
        self.0.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}
