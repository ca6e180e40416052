//! Error types for the anchor subsystem.

use thiserror::Error;

use crate::persistence::GatewayError;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, AnchorError>;

/// Anchor subsystem error type.
#[derive(Debug, Error)]
pub enum AnchorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Area map finalization failed: {0}")]
    AreaMap(String),

    #[error("Anchor persistence error: {0}")]
    Persistence(#[from] GatewayError),

    #[error("Tracking unavailable: {0}")]
    Tracking(String),
}

impl From<toml::de::Error> for AnchorError {
    fn from(e: toml::de::Error) -> Self {
        AnchorError::Config(e.to_string())
    }
}
