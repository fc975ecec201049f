//! Frame-driven animation runner
//!
//! Plays a `Tween` on its own task at the headless frame rate, invoking a
//! frame callback with (value, progress) and a completion callback exactly
//! once. The runner uses `tokio::time::Instant`, so tests drive it
//! deterministically on the paused test clock. Which visual property the
//! value means is entirely the caller's business; radius growth and
//! opacity decay both ride the same contract.

use geopulse_core::Tween;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Headless frame cadence (~60 fps).
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// How long one pulse marker lives.
pub const PULSE_DURATION: Duration = Duration::from_millis(3000);
/// Pulse radius at birth.
pub const PULSE_RADIUS_FROM: f64 = 0.1;
/// Pulse radius at expiry.
pub const PULSE_RADIUS_TO: f64 = 80.0;

/// The standard pulse: radius growth over `PULSE_DURATION`. Opacity decay
/// is derived from the same progress by the marker layer.
pub fn pulse_tween() -> Tween {
    Tween::new(PULSE_DURATION, PULSE_RADIUS_FROM, PULSE_RADIUS_TO)
}

/// Play `tween` on a spawned frame task.
///
/// `on_frame(value, progress)` fires immediately with the start value,
/// then once per frame; `on_complete` fires exactly once when progress
/// reaches 1, after which no further callbacks run and the task ends.
/// Aborting the returned handle silences both callbacks.
pub fn spawn_animation<F, C>(tween: Tween, mut on_frame: F, on_complete: C) -> JoinHandle<()>
where
    F: FnMut(f64, f64) + Send + 'static,
    C: FnOnce() + Send + 'static,
{
    tokio::spawn(async move {
        let started = Instant::now();
        let mut interval = tokio::time::interval(FRAME_INTERVAL);

        loop {
            // The first tick completes immediately, producing the opening
            // frame at elapsed zero.
            interval.tick().await;
            let frame = tween.sample(started.elapsed());
            on_frame(frame.value, frame.progress);
            if frame.progress >= 1.0 {
                on_complete();
                break;
            }
        }
    })
}
