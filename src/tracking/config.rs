use serde::{Deserialize, Serialize};

/// Thresholds for the per-track classifier and the vision session loop
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Samples kept per track (FIFO window)
    pub buffer_capacity: usize,

    /// Minimum samples before the wasp rule is evaluated
    pub wasp_min_samples: usize,

    /// Fraction of the frame height, from the top, treated as the hover band
    pub wasp_top_fraction: f64,

    /// Share of samples that must sit in the hover band
    pub wasp_band_ratio: f64,

    /// Most recent samples used to measure horizontal spread
    pub wasp_hover_window: usize,

    /// Horizontal spread (px) below which a hovering track is a wasp
    pub wasp_max_spread: f64,

    /// Minimum samples before the direction rule is evaluated
    pub direction_min_samples: usize,

    /// Samples averaged at each end of the buffer
    pub direction_edge_window: usize,

    /// Horizontal shift (px) needed to call a direction
    pub direction_min_shift: f64,

    /// Frames without a sighting before a track is evicted
    pub max_idle_frames: u64,

    /// Length of one vision session (seconds)
    pub session_seconds: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 30,
            wasp_min_samples: 5,
            wasp_top_fraction: 1.0 / 3.0,
            wasp_band_ratio: 0.7,
            wasp_hover_window: 10,
            wasp_max_spread: 50.0,
            direction_min_samples: 10,
            direction_edge_window: 5,
            direction_min_shift: 40.0,
            max_idle_frames: 300,
            session_seconds: 60,
        }
    }
}
