//! Linear tween math for decay/growth animations
//!
//! A `Tween` is a pure value: it knows how to interpolate between two
//! numbers over a duration, but carries no clock. The runtime's animator
//! owns the start instant and feeds elapsed time into `sample`, which keeps
//! every interpolation deterministic and testable without waiting.

use std::time::Duration;

/// A linear interpolation from one value to another over a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub duration: Duration,
    pub from: f64,
    pub to: f64,
}

/// One sampled frame of a tween.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Interpolated value at this instant
    pub value: f64,
    /// Normalized progress in [0, 1]
    pub progress: f64,
}

impl Tween {
    pub fn new(duration: Duration, from: f64, to: f64) -> Self {
        Self { duration, from, to }
    }

    /// Sample the tween at `elapsed` time since its start.
    ///
    /// Progress is `elapsed / duration` clamped to [0, 1]. The endpoints
    /// are exact: progress 0 yields `from` and progress 1 yields `to`
    /// bit-for-bit, so completion handlers can key off the final value.
    /// A zero-duration tween is complete immediately.
    pub fn sample(&self, elapsed: Duration) -> Frame {
        let progress = if self.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
        };
        let value = if progress >= 1.0 {
            self.to
        } else {
            self.from + (self.to - self.from) * progress
        };
        Frame { value, progress }
    }

    /// True once `elapsed` has reached the full duration.
    pub fn is_complete(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }
}
