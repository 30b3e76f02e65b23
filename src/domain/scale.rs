// Upper bound selection for bounded gauges (bar / radial)
use super::error::DashboardError;
use serde::{Deserialize, Serialize};

/// Auto mode picks the first rung the value is strictly below.
pub const AUTO_SCALE_LADDER: [f64; 6] = [20.0, 50.0, 100.0, 200.0, 500.0, 1000.0];
/// Bound used for anything below 10.
pub const AUTO_SCALE_FLOOR: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "f64", try_from = "f64")]
pub enum FixedScale {
    Tenth,
    ThreeTenths,
    Half,
    One,
}

impl FixedScale {
    pub const ALL: [FixedScale; 4] = [
        FixedScale::Tenth,
        FixedScale::ThreeTenths,
        FixedScale::Half,
        FixedScale::One,
    ];

    pub fn value(self) -> f64 {
        match self {
            FixedScale::Tenth => 0.1,
            FixedScale::ThreeTenths => 0.3,
            FixedScale::Half => 0.5,
            FixedScale::One => 1.0,
        }
    }
}

impl From<FixedScale> for f64 {
    fn from(scale: FixedScale) -> Self {
        scale.value()
    }
}

impl TryFrom<f64> for FixedScale {
    type Error = DashboardError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        FixedScale::ALL
            .into_iter()
            .find(|scale| (scale.value() - value).abs() < 1e-9)
            .ok_or(DashboardError::InvalidFixedScale(value))
    }
}

/// Global (not per-channel) scale selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum ScaleMode {
    #[default]
    Auto,
    Fixed { max: FixedScale },
}

pub fn derive_max(value: f64, mode: ScaleMode) -> f64 {
    match mode {
        ScaleMode::Fixed { max } => max.value(),
        ScaleMode::Auto => {
            if value.is_nan() || value < AUTO_SCALE_FLOOR {
                return AUTO_SCALE_FLOOR;
            }
            AUTO_SCALE_LADDER
                .into_iter()
                .find(|rung| value < *rung)
                .unwrap_or_else(|| (value / 1000.0).ceil() * 1000.0)
        }
    }
}

pub fn fill_fraction(value: f64, max: f64) -> f64 {
    (value / max).min(1.0)
}

/// A gauge reading ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Gauge {
    pub channel_id: String,
    pub value: f64,
    pub max: f64,
    pub fill: f64,
}

impl Gauge {
    pub fn new(channel_id: String, value: f64, mode: ScaleMode) -> Self {
        let max = derive_max(value, mode);
        Self {
            channel_id,
            value,
            max,
            fill: fill_fraction(value, max),
        }
    }
}
