//! Top-level configuration loading.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::placement::PlacementConfig;
use crate::session::SessionConfig;

/// Main configuration structure, loadable from a TOML file:
///
/// ```toml
/// [session]
/// anchor_dir = "anchors"
///
/// [placement]
/// facing_fallback_threshold_deg = 175.0
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DrishtiConfig {
    /// Session lifecycle settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Placement controller settings.
    #[serde(default)]
    pub placement: PlacementConfig,
}

impl DrishtiConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DrishtiConfig = toml::from_str(&content)?;
        Ok(config)
    }
}
