//! Timestamp wrapper for tracked values.

use serde::{Deserialize, Serialize};

/// A value paired with the tracking-service timestamp it was observed at,
/// in seconds on the tracking clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timestamped<T> {
    /// The observed value.
    pub data: T,
    /// Tracking timestamp in seconds.
    pub timestamp: f64,
}

impl<T> Timestamped<T> {
    /// Wrap a value with its timestamp.
    #[inline]
    pub fn new(data: T, timestamp: f64) -> Self {
        Self { data, timestamp }
    }
}
