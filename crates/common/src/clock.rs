//! Clock and timing utilities for frame playback.
//!
//! All Flipstage timestamps are nanoseconds on a monotonic clock anchored
//! at a fixed epoch (the moment the stage clock started). This module
//! provides utilities for:
//! - Capturing the epoch
//! - Reading the current timestamp
//! - Converting between nanoseconds, milliseconds, and seconds

use std::time::Instant;

/// Monotonic timestamp in nanoseconds since the stage clock epoch.
pub type TimestampNs = u64;

/// A stage clock that provides monotonic timestamps relative to
/// a fixed epoch.
#[derive(Debug, Clone)]
pub struct StageClock {
    /// The instant the clock started.
    epoch: Instant,

    /// Wall-clock time at epoch (ISO 8601 string).
    epoch_wall: String,
}

impl StageClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Current timestamp on this clock.
    pub fn now_ns(&self) -> TimestampNs {
        self.epoch.elapsed().as_nanos() as u64
    }

    /// Get seconds elapsed since the epoch.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at the epoch.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// Convert a nanosecond value to seconds.
    pub fn ns_to_secs(ns: u64) -> f64 {
        ns as f64 / 1_000_000_000.0
    }

    /// Convert seconds to nanoseconds.
    pub fn secs_to_ns(secs: f64) -> u64 {
        (secs * 1_000_000_000.0) as u64
    }
}

/// Interval between display refreshes at the given rate.
pub fn refresh_interval_ns(refresh_hz: u32) -> u64 {
    1_000_000_000 / refresh_hz.max(1) as u64
}
