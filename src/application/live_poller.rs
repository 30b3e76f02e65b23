// Live poller - Present-value readings on a fixed cadence
use crate::application::metering_repository::MeteringRepository;
use crate::application::round_gate::RoundGate;
use crate::domain::channel::Channel;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// One tick's readings, one entry per polled channel.
pub type LiveReadings = HashMap<String, f64>;

const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Clone)]
pub struct LivePoller {
    repository: Arc<dyn MeteringRepository>,
    period: Duration,
    request_timeout: Duration,
}

impl LivePoller {
    pub fn new(
        repository: Arc<dyn MeteringRepository>,
        period: Duration,
        request_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            period: period.max(MIN_PERIOD),
            request_timeout,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Read every channel concurrently. A failing channel reads as `0`.
    pub async fn poll_live(&self, channels: &[Channel]) -> LiveReadings {
        let reads = channels.iter().map(|c| self.poll_channel(&c.id));
        let values = join_all(reads).await;
        channels.iter().map(|c| c.id.clone()).zip(values).collect()
    }

    async fn poll_channel(&self, channel_id: &str) -> f64 {
        match tokio::time::timeout(self.request_timeout, self.repository.fetch_live(channel_id))
            .await
        {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                tracing::warn!(channel = %channel_id, error = %e, "live read failed");
                0.0
            }
            Err(_) => {
                tracing::warn!(channel = %channel_id, "live read timed out");
                0.0
            }
        }
    }

    /// Start ticking immediately and then every `period`.
    ///
    /// Each tick runs on its own task, so a slow tick may still be in flight
    /// when the next one starts. A tick's readings reach `on_tick` only if no
    /// later tick has been delivered first, and never after the returned
    /// handle is cancelled.
    pub fn spawn<F>(&self, channels: Vec<Channel>, on_tick: F) -> PollerHandle
    where
        F: Fn(LiveReadings) + Send + Sync + 'static,
    {
        let gate = Arc::new(RoundGate::new());
        let on_tick = Arc::new(on_tick);
        let channels: Arc<[Channel]> = channels.into();
        let poller = self.clone();
        let timer_gate = gate.clone();

        let timer = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poller.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(generation) = timer_gate.issue() else {
                    break;
                };

                let poller = poller.clone();
                let channels = channels.clone();
                let gate = timer_gate.clone();
                let on_tick = on_tick.clone();
                tokio::spawn(async move {
                    let readings = poller.poll_live(&channels).await;
                    if !gate.apply_if_newer(generation, || on_tick(readings)) {
                        tracing::debug!(generation, "dropping stale live tick");
                    }
                });
            }
        });

        PollerHandle { gate, timer }
    }
}

/// Cancels the poller when dropped.
pub struct PollerHandle {
    gate: Arc<RoundGate>,
    timer: JoinHandle<()>,
}

impl PollerHandle {
    pub fn cancel(&self) {
        self.gate.close();
        self.timer.abort();
    }

    #[cfg(test)]
    pub fn is_cancelled(&self) -> bool {
        self.gate.is_closed()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{FakeMeteringRepository, LiveReply};
    use std::sync::Mutex;

    fn channels(ids: &[&str]) -> Vec<Channel> {
        ids.iter().map(|id| Channel::new(*id, *id)).collect()
    }

    fn recorder() -> (Arc<Mutex<Vec<LiveReadings>>>, impl Fn(LiveReadings) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |readings: LiveReadings| sink.lock().unwrap().push(readings))
    }

    #[tokio::test]
    async fn test_failing_channel_reads_zero() {
        let repo = Arc::new(
            FakeMeteringRepository::new()
                .with_live("a", vec![LiveReply::Fail])
                .with_live("b", vec![LiveReply::Value(230.4)]),
        );
        let poller = LivePoller::new(repo, Duration::from_secs(1), Duration::from_secs(5));

        let readings = poller.poll_live(&channels(&["a", "b"])).await;

        assert_eq!(readings.len(), 2);
        assert_eq!(readings["a"], 0.0);
        assert_eq!(readings["b"], 230.4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_read_times_out_to_zero() {
        let repo = Arc::new(FakeMeteringRepository::new().with_live(
            "a",
            vec![LiveReply::Delayed(Duration::from_secs(60), 5.0)],
        ));
        let poller = LivePoller::new(repo, Duration::from_secs(1), Duration::from_secs(2));

        let readings = poller.poll_live(&channels(&["a"])).await;
        assert_eq!(readings["a"], 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_tick_never_overwrites_newer_one() {
        let repo = Arc::new(FakeMeteringRepository::new().with_live(
            "a",
            vec![
                LiveReply::Delayed(Duration::from_millis(500), 1.0),
                LiveReply::Delayed(Duration::from_millis(50), 2.0),
                LiveReply::Delayed(Duration::from_secs(3600), 3.0),
            ],
        ));
        let poller = LivePoller::new(repo, Duration::from_millis(100), Duration::from_secs(7200));
        let (seen, sink) = recorder();

        let handle = poller.spawn(channels(&["a"]), sink);
        tokio::time::sleep(Duration::from_millis(600)).await;
        handle.cancel();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["a"], 2.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_in_flight_tick() {
        let repo = Arc::new(FakeMeteringRepository::new().with_live(
            "a",
            vec![LiveReply::Delayed(Duration::from_millis(500), 42.0)],
        ));
        let poller = LivePoller::new(repo.clone(), Duration::from_secs(1), Duration::from_secs(5));
        let (seen, sink) = recorder();

        let handle = poller.spawn(channels(&["a"]), sink);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(repo.live_calls(), 1);

        handle.cancel();
        assert!(handle.is_cancelled());
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(repo.live_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_repeat_on_period() {
        let repo = Arc::new(FakeMeteringRepository::new().with_live("a", vec![LiveReply::Value(9.0)]));
        let poller = LivePoller::new(repo.clone(), Duration::from_secs(1), Duration::from_secs(5));
        let (seen, sink) = recorder();

        let handle = poller.spawn(channels(&["a"]), sink);
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        drop(handle);

        assert_eq!(repo.live_calls(), 3);
        assert_eq!(seen.lock().unwrap().len(), 3);
    }
}
