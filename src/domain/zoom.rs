// Zoom controller - Per-channel horizontal density driven by pinch gestures
use std::collections::HashMap;

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 10.0;
pub const DEFAULT_ZOOM: f64 = MAX_ZOOM;
pub const PINCH_SENSITIVITY: f64 = 0.2;

/// Neutral gesture scale.
const NEUTRAL_SCALE: f64 = 1.0;

/// Larger levels compress the x-axis: points are spaced at
/// `base_spacing / level`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ZoomLevel(f64);

impl ZoomLevel {
    pub fn new(level: f64) -> Self {
        if level.is_nan() {
            return Self::default();
        }
        Self(level.clamp(MIN_ZOOM, MAX_ZOOM))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Apply one incremental gesture factor `delta` (1.0 = no change).
    pub fn apply_pinch(self, delta: f64) -> Self {
        if !delta.is_finite() {
            return self;
        }
        Self::new(self.0 - (delta - NEUTRAL_SCALE) * PINCH_SENSITIVITY)
    }

    pub fn spacing(self, base_spacing: f64) -> f64 {
        base_spacing / self.0
    }
}

impl Default for ZoomLevel {
    fn default() -> Self {
        Self(DEFAULT_ZOOM)
    }
}

/// Gesture updates report the scale accumulated since the gesture began.
/// Each update moves the level by the factor relative to the previous update,
/// so the outcome depends on how many updates a gesture produced, not only on
/// its final scale.
#[derive(Debug, Clone, Default)]
pub struct ZoomController {
    levels: HashMap<String, ZoomLevel>,
    gesture_scale: HashMap<String, f64>,
}

impl ZoomController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self, channel_id: &str) -> ZoomLevel {
        self.levels.get(channel_id).copied().unwrap_or_default()
    }

    /// Scale most recently reported by the channel's active gesture.
    pub fn gesture_scale(&self, channel_id: &str) -> f64 {
        self.gesture_scale
            .get(channel_id)
            .copied()
            .unwrap_or(NEUTRAL_SCALE)
    }

    /// Non-positive or non-finite scales are ignored.
    pub fn pinch_update(&mut self, channel_id: &str, scale: f64) -> ZoomLevel {
        let current = self.level(channel_id);
        if !scale.is_finite() || scale <= 0.0 {
            return current;
        }

        let level = current.apply_pinch(scale / self.gesture_scale(channel_id));
        self.levels.insert(channel_id.to_string(), level);
        self.gesture_scale.insert(channel_id.to_string(), scale);
        level
    }

    /// The next gesture starts again from a neutral scale.
    pub fn pinch_end(&mut self, channel_id: &str) {
        self.gesture_scale.remove(channel_id);
    }
}
