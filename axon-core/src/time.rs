//! Stable time types for the scheduler protocol.
//!
//! [`DurationMs`] and [`TimeMs`] serialize as plain integers
//! (milliseconds), not as serde's internal `{"secs": N, "nanos": N}`
//! format. This gives a stable, portable, human-readable wire format,
//! and integer milliseconds keep timed-queue ordering exact — no float
//! comparisons inside the scheduler.

use serde::{Deserialize, Serialize};
use std::ops::Add;
use std::time::Duration;

/// Duration in milliseconds with a stable JSON serialization format.
///
/// # Examples
///
/// ```
/// use axon_core::DurationMs;
///
/// let d = DurationMs::from_secs_f64(1.5);
/// assert_eq!(d.as_millis(), 1500);
///
/// let json = serde_json::to_string(&d).unwrap();
/// assert_eq!(json, "1500");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DurationMs(u64);

impl DurationMs {
    /// Zero duration.
    pub const ZERO: Self = Self(0);

    /// Create from milliseconds.
    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Create from whole seconds.
    pub fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    /// Create from fractional seconds. Negative inputs clamp to zero.
    pub fn from_secs_f64(secs: f64) -> Self {
        if secs <= 0.0 {
            return Self::ZERO;
        }
        Self((secs * 1000.0).round() as u64)
    }

    /// The value in milliseconds.
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Convert to `std::time::Duration`.
    pub fn to_std(&self) -> Duration {
        Duration::from_millis(self.0)
    }
}

impl From<Duration> for DurationMs {
    fn from(d: Duration) -> Self {
        Self(d.as_millis() as u64)
    }
}

/// An absolute instant on a run's clock, in milliseconds.
///
/// Under the simulation scheduler this is virtual time starting at zero;
/// under the wall-clock scheduler it is elapsed time since the driver
/// started. It is never a calendar timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeMs(u64);

impl TimeMs {
    /// The start of the run's clock.
    pub const ZERO: Self = Self(0);

    /// Create from milliseconds since the start of the run.
    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// The value in milliseconds.
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Fractional seconds since the start of the run.
    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1000.0
    }
}

impl Add<DurationMs> for TimeMs {
    type Output = TimeMs;

    fn add(self, rhs: DurationMs) -> TimeMs {
        TimeMs(self.0.saturating_add(rhs.as_millis()))
    }
}
