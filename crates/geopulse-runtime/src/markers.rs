//! Transient pulse markers
//!
//! Every resolved mention drops one marker that lives for a single pulse:
//! radius grows while opacity decays, then the marker is removed exactly
//! once on completion. The layer keeps live markers in spawn order and
//! hands out snapshots only: render hosts poll `active` and never touch
//! the table itself.

use crate::aggregate::FxIndexMap;
use crate::animator::{pulse_tween, spawn_animation, PULSE_RADIUS_FROM};
use geopulse_core::LonLat;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Fill opacity at marker birth; stroke opacity starts at 1.
const FILL_OPACITY_FROM: f64 = 0.8;

/// One live pulse marker.
#[derive(Debug, Clone)]
pub struct Marker {
    pub coords: LonLat,
    pub color: &'static str,
    pub radius: f64,
    /// Stroke opacity, decaying 1 -> 0 over the pulse
    pub opacity: f64,
    /// Fill opacity, decaying 0.8 -> 0
    pub fill_opacity: f64,
}

struct LayerInner {
    live: FxIndexMap<u64, Marker>,
    next_id: u64,
    spawned: u64,
}

/// Registry of live pulse markers.
#[derive(Clone)]
pub struct MarkerLayer {
    inner: Arc<Mutex<LayerInner>>,
}

impl MarkerLayer {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(LayerInner {
                live: IndexMap::with_hasher(FxBuildHasher),
                next_id: 0,
                spawned: 0,
            })),
        }
    }

    /// Drop a pulse marker at `coords` and animate it to expiry.
    ///
    /// Returns the marker id. The marker is visible in `active` from now
    /// until its pulse completes, at which point it is removed exactly
    /// once.
    pub fn drop_marker(&self, coords: LonLat, color: &'static str) -> u64 {
        let id = {
            let mut inner = lock(&self.inner);
            let id = inner.next_id;
            inner.next_id += 1;
            inner.spawned += 1;
            inner.live.insert(
                id,
                Marker {
                    coords,
                    color,
                    radius: PULSE_RADIUS_FROM,
                    opacity: 1.0,
                    fill_opacity: FILL_OPACITY_FROM,
                },
            );
            id
        };

        let frame_inner = Arc::clone(&self.inner);
        let done_inner = Arc::clone(&self.inner);
        spawn_animation(
            pulse_tween(),
            move |radius, progress| {
                let mut inner = lock(&frame_inner);
                if let Some(marker) = inner.live.get_mut(&id) {
                    marker.radius = radius;
                    marker.opacity = 1.0 - progress;
                    marker.fill_opacity = FILL_OPACITY_FROM * (1.0 - progress);
                }
            },
            move || {
                lock(&done_inner).live.shift_remove(&id);
                debug!("marker {} expired", id);
            },
        );

        id
    }

    /// Snapshot of live markers in spawn order.
    pub fn active(&self) -> Vec<Marker> {
        lock(&self.inner).live.values().cloned().collect()
    }

    /// Number of currently live markers.
    pub fn live(&self) -> usize {
        lock(&self.inner).live.len()
    }

    /// Total markers ever dropped.
    pub fn spawned(&self) -> u64 {
        lock(&self.inner).spawned
    }
}

impl Default for MarkerLayer {
    fn default() -> Self {
        Self::new()
    }
}

// Frame callbacks are synchronous; a poisoned lock only means a previous
// frame panicked, so recover the data rather than propagate.
fn lock(inner: &Arc<Mutex<LayerInner>>) -> MutexGuard<'_, LayerInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}
