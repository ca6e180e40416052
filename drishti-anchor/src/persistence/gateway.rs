//! Anchor file gateway: YAML records keyed by area, written atomically.
//!
//! ## File format
//!
//! `{area_key}.yaml` holds a YAML sequence of records, each exactly:
//!
//! ```yaml
//! - kind: 1
//!   position: [0.0, 0.0, 2.0]
//!   orientation: [0.0, 0.0, 0.0, 1.0]
//! ```
//!
//! No optional fields, no version field — the schema is implicitly
//! version 0; evolving it requires an explicit migration policy.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::anchor::AnchorRecord;
use crate::tracking::AreaKey;

/// Errors from the anchor file gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No anchor file exists for the area. Non-fatal: callers degrade to
    /// an empty anchor set.
    #[error("No anchor file for area {0}")]
    NotFound(String),

    /// The file exists but does not parse. Non-fatal: callers degrade to
    /// an empty anchor set rather than crash.
    #[error("Anchor file for area {key} is corrupt: {reason}")]
    Corrupt {
        /// Area key of the offending file.
        key: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// Underlying filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serializes and restores the anchor set, one file per mapped area.
pub struct AnchorGateway {
    base_dir: PathBuf,
}

impl AnchorGateway {
    /// Create a gateway rooted at `base_dir`, creating the directory if
    /// needed.
    pub fn new(base_dir: &Path) -> Result<Self, GatewayError> {
        if !base_dir.exists() {
            fs::create_dir_all(base_dir)?;
        }
        Ok(Self {
            base_dir: base_dir.to_path_buf(),
        })
    }

    fn area_path(&self, key: &AreaKey) -> PathBuf {
        self.base_dir.join(format!("{}.yaml", key))
    }

    /// Persist the full anchor set for an area, overwriting any prior
    /// contents.
    ///
    /// The write goes to a temp file in the same directory which is then
    /// renamed over the target, so a concurrent reader observes either the
    /// old complete file or the new one, never a partial state.
    pub fn save(&self, records: &[AnchorRecord], key: &AreaKey) -> Result<(), GatewayError> {
        let normalized: Vec<AnchorRecord> = records
            .iter()
            .map(|r| AnchorRecord {
                kind: r.kind,
                position: r.position,
                orientation: r.orientation.normalized(),
            })
            .collect();

        let yaml = serde_yaml::to_string(&normalized).map_err(|e| GatewayError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        let target = self.area_path(key);
        let tmp = self.base_dir.join(format!("{}.yaml.tmp", key));
        fs::write(&tmp, yaml)?;
        fs::rename(&tmp, &target)?;

        log::info!("Saved {} anchors for area {}", normalized.len(), key);
        Ok(())
    }

    /// Load the anchor set for an area.
    pub fn load(&self, key: &AreaKey) -> Result<Vec<AnchorRecord>, GatewayError> {
        let path = self.area_path(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(GatewayError::NotFound(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let records: Vec<AnchorRecord> =
            serde_yaml::from_str(&content).map_err(|e| GatewayError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        log::info!("Loaded {} anchors for area {}", records.len(), key);
        Ok(records)
    }

    /// Load, degrading missing or corrupt files to an empty set. A corrupt
    /// file is logged as a warning; a missing one is the normal first-run
    /// case.
    pub fn load_or_empty(&self, key: &AreaKey) -> Vec<AnchorRecord> {
        match self.load(key) {
            Ok(records) => records,
            Err(GatewayError::NotFound(_)) => {
                log::debug!("No prior anchors for area {}", key);
                Vec::new()
            }
            Err(e) => {
                log::warn!("Discarding unreadable anchor file: {}", e);
                Vec::new()
            }
        }
    }

    /// Enumerate areas that have an anchor file.
    pub fn list_areas(&self) -> Result<Vec<AreaKey>, GatewayError> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(AreaKey::new(stem));
                }
            }
        }
        keys.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(keys)
    }

    /// Delete the anchor file for an area, if present.
    pub fn delete(&self, key: &AreaKey) -> Result<(), GatewayError> {
        let path = self.area_path(key);
        if path.exists() {
            fs::remove_file(&path)?;
            log::info!("Deleted anchor file for area {}", key);
        }
        Ok(())
    }
}
