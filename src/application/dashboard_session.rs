// Dashboard sessions - Lifecycle of one active dashboard screen
use crate::application::historical_fetcher::HistoricalFetcher;
use crate::application::live_poller::{LivePoller, PollerHandle};
use crate::application::metering_repository::MeteringRepository;
use crate::application::round_gate::RoundGate;
use crate::application::series_cache::SeriesCache;
use crate::domain::channel::{Channel, DashboardKind, validate_channels};
use crate::domain::dashboard::DashboardViewModel;
use crate::domain::scale::ScaleMode;
use crate::domain::time_range::{TimeRange, align_window_end};
use crate::domain::zoom::ZoomLevel;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;

pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Opens sessions that share a repository but nothing else.
#[derive(Clone)]
pub struct DashboardService {
    repository: Arc<dyn MeteringRepository>,
    clock: Arc<dyn Clock>,
    poll_period: Duration,
    request_timeout: Duration,
}

impl DashboardService {
    pub fn new(
        repository: Arc<dyn MeteringRepository>,
        clock: Arc<dyn Clock>,
        poll_period: Duration,
        request_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            clock,
            poll_period,
            request_timeout,
        }
    }

    /// A new, not yet activated session with its own series cache.
    pub fn open_session(&self, channels: Vec<Channel>, kind: DashboardKind) -> DashboardSession {
        let fetcher = HistoricalFetcher::new(
            self.repository.clone(),
            Arc::new(SeriesCache::new()),
            self.request_timeout,
        );
        let poller = LivePoller::new(
            self.repository.clone(),
            self.poll_period,
            self.request_timeout,
        );
        DashboardSession::new(channels, kind, fetcher, poller, self.clock.clone())
    }
}

/// Owns the view-model and every task feeding it.
///
/// Round ordering: live ticks are last-issued-wins, and a historical round
/// only lands while its range is still the active one. Nothing lands after
/// [`DashboardSession::deactivate`].
pub struct DashboardSession {
    channels: Arc<[Channel]>,
    kind: DashboardKind,
    fetcher: HistoricalFetcher,
    poller: LivePoller,
    clock: Arc<dyn Clock>,
    state: Arc<watch::Sender<DashboardViewModel>>,
    history_gate: Arc<RoundGate>,
    poll_handle: Mutex<Option<PollerHandle>>,
    history_tasks: Mutex<JoinSet<()>>,
}

impl DashboardSession {
    pub fn new(
        channels: Vec<Channel>,
        kind: DashboardKind,
        fetcher: HistoricalFetcher,
        poller: LivePoller,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (state, _) = watch::channel(DashboardViewModel::new(channels.clone(), kind));
        Self {
            channels: channels.into(),
            kind,
            fetcher,
            poller,
            clock,
            state: Arc::new(state),
            history_gate: Arc::new(RoundGate::new()),
            poll_handle: Mutex::new(None),
            history_tasks: Mutex::new(JoinSet::new()),
        }
    }

    pub fn snapshot(&self) -> DashboardViewModel {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardViewModel> {
        self.state.subscribe()
    }

    #[cfg(test)]
    pub fn series_cache(&self) -> &Arc<SeriesCache> {
        self.fetcher.cache()
    }

    pub fn is_active(&self) -> bool {
        lock(&self.poll_handle).is_some() && !self.history_gate.is_closed()
    }

    /// Start polling and, for time-series dashboards, the first history round.
    pub fn activate(&self) {
        if self.history_gate.is_closed() {
            tracing::warn!("ignoring activation of a deactivated session");
            return;
        }

        let mut poll_handle = lock(&self.poll_handle);
        if poll_handle.is_some() {
            return;
        }

        self.state.send_modify(DashboardViewModel::begin_loading);

        if let Err(e) = validate_channels(&self.channels) {
            tracing::error!(error = %e, "cannot start dashboard session");
            self.state.send_modify(|vm| vm.fail_round(&e));
            return;
        }

        tracing::info!(
            channels = self.channels.len(),
            kind = ?self.kind,
            period_ms = self.poller.period().as_millis() as u64,
            "activating dashboard session"
        );

        let state = self.state.clone();
        let clock = self.clock.clone();
        *poll_handle = Some(self.poller.spawn(self.channels.to_vec(), move |readings| {
            let fetched_at_ms = clock.now_ms();
            state.send_modify(|vm| vm.apply_live(readings, fetched_at_ms));
        }));
        drop(poll_handle);

        if self.kind.fetches_history() {
            let mut range = TimeRange::default();
            let issued = self
                .history_gate
                .issue_with(|_| range = self.state.borrow().active_range);
            if let Some(generation) = issued {
                self.start_history_round(range, generation);
            }
        }
    }

    /// Switch the active range. The poller keeps running.
    pub fn select_range(&self, range: TimeRange) {
        if !self.is_active() {
            self.state.send_modify(|vm| vm.active_range = range);
            return;
        }

        if !self.kind.fetches_history() {
            self.state.send_modify(|vm| vm.switch_range(range));
            return;
        }

        // Issuing and switching are one step, so no round can merge in between.
        let issued = self
            .history_gate
            .issue_with(|_| self.state.send_modify(|vm| vm.switch_range(range)));
        let Some(generation) = issued else {
            return;
        };
        tracing::debug!(range = range.label(), generation, "time range changed");
        self.start_history_round(range, generation);
    }

    /// Returns `None` for channels that are not part of this dashboard.
    pub fn pinch_update(&self, channel_id: &str, scale: f64) -> Option<ZoomLevel> {
        let mut level = None;
        self.state.send_if_modified(|vm| {
            if !vm.has_channel(channel_id) {
                return false;
            }
            level = Some(vm.zoom.pinch_update(channel_id, scale));
            true
        });
        level
    }

    pub fn pinch_end(&self, channel_id: &str) -> bool {
        self.state.send_if_modified(|vm| {
            if !vm.has_channel(channel_id) {
                return false;
            }
            vm.zoom.pinch_end(channel_id);
            true
        })
    }

    pub fn set_scale_mode(&self, mode: ScaleMode) {
        self.state.send_modify(|vm| vm.scale_mode = mode);
    }

    /// Stop the poller and discard in-flight rounds without waiting on them.
    pub fn deactivate(&self) {
        if self.history_gate.is_closed() {
            return;
        }
        self.history_gate.close();
        if let Some(handle) = lock(&self.poll_handle).take() {
            handle.cancel();
        }
        lock(&self.history_tasks).abort_all();
        tracing::info!(channels = self.channels.len(), "dashboard session deactivated");
    }

    fn start_history_round(&self, range: TimeRange, generation: u64) {
        let fetcher = self.fetcher.clone();
        let channels = self.channels.clone();
        let gate = self.history_gate.clone();
        let state = self.state.clone();
        let now_ms = align_window_end(self.clock.now_ms());

        let mut tasks = lock(&self.history_tasks);
        if self.history_gate.is_closed() {
            return;
        }
        while tasks.try_join_next().is_some() {}
        // Superseded rounds keep running so their series still reach the cache.
        tasks.spawn(async move {
            let result = fetcher.fetch(&channels, range, now_ms).await;
            let merged = gate.apply_if_latest(generation, || match result {
                Ok(series) => state.send_modify(|vm| vm.apply_history(series)),
                Err(e) => {
                    tracing::error!(error = %e, range = range.label(), "history round failed");
                    state.send_modify(|vm| vm.fail_round(&e));
                }
            });
            if !merged {
                tracing::debug!(generation, range = range.label(), "discarding superseded history round");
            }
        });
    }
}

impl Drop for DashboardSession {
    fn drop(&mut self) {
        self.deactivate();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
