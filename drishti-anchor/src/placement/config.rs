//! Placement controller configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the placement controller.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Angle between the plane normal and the camera forward vector, in
    /// degrees, below which the anchor's facing vector is derived by the
    /// double cross-product. At or beyond it (normal nearly opposite the
    /// camera look direction, where the cross product is numerically
    /// unstable) the controller falls back to `normal × camera_right`.
    ///
    /// A stability guard, not a semantic boundary — any near-180° cutoff
    /// works. Default: 175°.
    #[serde(default = "default_facing_fallback_threshold_deg")]
    pub facing_fallback_threshold_deg: f64,

    /// Foreground ticks to wait for a depth frame before aborting a
    /// placement. Default: 120.
    #[serde(default = "default_depth_timeout_ticks")]
    pub depth_timeout_ticks: u32,
}

fn default_facing_fallback_threshold_deg() -> f64 {
    175.0
}

fn default_depth_timeout_ticks() -> u32 {
    120
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            facing_fallback_threshold_deg: default_facing_fallback_threshold_deg(),
            depth_timeout_ticks: default_depth_timeout_ticks(),
        }
    }
}
