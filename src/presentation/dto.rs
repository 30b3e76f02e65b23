// Request and response bodies for the HTTP surface
use crate::domain::channel::{Channel, DashboardKind};
use crate::domain::dashboard::{DashboardViewModel, SessionStatus};
use crate::domain::scale::{Gauge, ScaleMode};
use crate::domain::telemetry::LiveValue;
use crate::domain::time_range::{TimeRange, format_axis_label};
use crate::domain::zoom::ZoomLevel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub kind: DashboardKind,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub id: u64,
}

#[derive(Debug, Deserialize)]
pub struct RangeRequest {
    pub label: String,
}

#[derive(Debug, Deserialize)]
pub struct PinchRequest {
    pub scale: f64,
    #[serde(default)]
    pub ended: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeDescriptor {
    pub label: &'static str,
    pub duration_seconds: i64,
    pub bucket_interval_seconds: i64,
}

impl From<TimeRange> for RangeDescriptor {
    fn from(range: TimeRange) -> Self {
        Self {
            label: range.label(),
            duration_seconds: range.duration_seconds(),
            bucket_interval_seconds: range.bucket_interval_seconds(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModelResponse {
    pub kind: DashboardKind,
    pub channels: Vec<Channel>,
    pub active_range: &'static str,
    pub status: SessionStatus,
    pub loading: bool,
    pub error: Option<String>,
    pub scale_mode: ScaleMode,
    pub live_values: Vec<LiveValue>,
    pub series: Vec<SeriesResponse>,
    pub zoom: Vec<ZoomResponse>,
    pub gauges: Vec<Gauge>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesResponse {
    pub channel_id: String,
    pub points: Vec<PointResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointResponse {
    pub value: f64,
    pub timestamp_seconds: i64,
    pub label: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomResponse {
    pub channel_id: String,
    pub level: f64,
    /// Horizontal point spacing as a multiple of the renderer's base spacing.
    pub spacing_factor: f64,
}

impl ZoomResponse {
    pub fn new(channel_id: String, level: ZoomLevel) -> Self {
        Self {
            channel_id,
            level: level.value(),
            spacing_factor: level.spacing(1.0),
        }
    }
}

impl From<&DashboardViewModel> for ViewModelResponse {
    fn from(vm: &DashboardViewModel) -> Self {
        let range = vm.active_range;

        let live_values = vm
            .channels
            .iter()
            .filter_map(|c| vm.live_values.get(&c.id).cloned())
            .collect();

        let series = vm
            .channels
            .iter()
            .filter_map(|c| {
                vm.series.get(&c.id).map(|points| SeriesResponse {
                    channel_id: c.id.clone(),
                    points: points
                        .iter()
                        .map(|p| PointResponse {
                            value: p.value,
                            timestamp_seconds: p.timestamp_seconds,
                            label: format_axis_label(p.timestamp_seconds, range),
                        })
                        .collect(),
                })
            })
            .collect();

        let zoom = vm
            .channels
            .iter()
            .map(|c| ZoomResponse::new(c.id.clone(), vm.zoom.level(&c.id)))
            .collect();

        Self {
            kind: vm.kind,
            channels: vm.channels.clone(),
            active_range: range.label(),
            status: vm.status,
            loading: vm.loading,
            error: vm.error.clone(),
            scale_mode: vm.scale_mode,
            live_values,
            series,
            zoom,
            gauges: vm.gauges(),
        }
    }
}
