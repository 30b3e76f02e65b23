// Dashboard view-model and its loading state machine
use super::channel::{Channel, DashboardKind};
use super::error::DashboardError;
use super::scale::{Gauge, ScaleMode};
use super::telemetry::{LiveValue, Series};
use super::time_range::TimeRange;
use super::zoom::ZoomController;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Idle,
    Loading,
    Ready,
    Error,
}

/// Everything the renderer needs for one dashboard session.
#[derive(Debug, Clone)]
pub struct DashboardViewModel {
    pub kind: DashboardKind,
    pub channels: Vec<Channel>,
    pub active_range: TimeRange,
    pub live_values: HashMap<String, LiveValue>,
    pub series: HashMap<String, Series>,
    pub zoom: ZoomController,
    pub scale_mode: ScaleMode,
    pub status: SessionStatus,
    pub loading: bool,
    pub error: Option<String>,
    live_settled: bool,
    history_settled: bool,
    has_loaded: bool,
}

impl DashboardViewModel {
    pub fn new(channels: Vec<Channel>, kind: DashboardKind) -> Self {
        Self {
            kind,
            channels,
            active_range: TimeRange::default(),
            live_values: HashMap::new(),
            series: HashMap::new(),
            zoom: ZoomController::new(),
            scale_mode: ScaleMode::default(),
            status: SessionStatus::Idle,
            loading: false,
            error: None,
            live_settled: false,
            history_settled: false,
            has_loaded: false,
        }
    }

    pub fn has_channel(&self, channel_id: &str) -> bool {
        self.channels.iter().any(|c| c.id == channel_id)
    }

    pub fn begin_loading(&mut self) {
        self.status = SessionStatus::Loading;
        self.loading = true;
    }

    /// Merge one poll tick. Every channel of the tick is present in
    /// `readings`, failed ones as `0`.
    pub fn apply_live(&mut self, readings: HashMap<String, f64>, fetched_at_ms: i64) {
        for (channel_id, value) in readings {
            let live = LiveValue::new(channel_id.clone(), value, fetched_at_ms);
            self.live_values.insert(channel_id, live);
        }
        self.live_settled = true;
        self.settle();
    }

    /// Replace the series map with one completed historical round.
    pub fn apply_history(&mut self, series: HashMap<String, Series>) {
        self.series = series;
        self.history_settled = true;
        self.settle();
    }

    pub fn fail_round(&mut self, error: &DashboardError) {
        self.error = Some(error.to_string());
        self.loading = false;
        if !self.has_loaded {
            self.status = SessionStatus::Error;
        }
    }

    /// Switch ranges: series of the old range are dropped right away and the
    /// loading flag comes back on until the new round settles. `status` does
    /// not return to `Loading` once the session has been ready.
    pub fn switch_range(&mut self, range: TimeRange) {
        self.active_range = range;
        if !self.kind.fetches_history() {
            return;
        }
        self.series.clear();
        self.history_settled = false;
        self.loading = true;
        if !self.has_loaded {
            self.status = SessionStatus::Loading;
        }
    }

    pub fn gauge(&self, channel_id: &str) -> Option<Gauge> {
        if !self.has_channel(channel_id) {
            return None;
        }
        let value = self
            .live_values
            .get(channel_id)
            .map(|live| live.value)
            .unwrap_or(0.0);
        Some(Gauge::new(channel_id.to_string(), value, self.scale_mode))
    }

    /// Gauges in channel order, recomputed from the current live values.
    pub fn gauges(&self) -> Vec<Gauge> {
        self.channels
            .iter()
            .filter_map(|c| self.gauge(&c.id))
            .collect()
    }

    fn settle(&mut self) {
        let history_done = self.history_settled || !self.kind.fetches_history();
        if self.live_settled && history_done {
            self.loading = false;
            self.status = SessionStatus::Ready;
            self.error = None;
            self.has_loaded = true;
        }
    }
}
