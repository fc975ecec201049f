//! Playback scheduling for sorted record sequences
//!
//! `Playback` is the synchronous state machine: a cursor over a
//! timestamp-ascending sequence that hands out one record per tick. It
//! carries no clock of its own. `spawn_playback` drives it from a tokio
//! interval and sends each record down a channel, so timing is owned
//! entirely by the runtime and tests can drive ticks directly or run
//! against the paused test clock.

use geopulse_core::MentionRecord;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Default emission period for mention streams.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(400);
/// Emission period used by the alert stream.
pub const ALERT_PERIOD: Duration = Duration::from_millis(1200);

/// Lifecycle of one playback run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Running,
    Stopped,
}

/// Fixed-cadence playback over a timestamp-ascending record sequence.
///
/// Emits exactly one record per tick, in sequence order. Exhaustion and
/// cancellation are both terminal: a stopped playback never runs again.
/// Replaying means constructing a fresh instance over a freshly produced
/// sequence, since sources are not restartable either.
pub struct Playback {
    records: Vec<MentionRecord>,
    cursor: usize,
    period: Duration,
    state: PlaybackState,
}

impl Playback {
    /// A new idle playback. `records` must already be sorted ascending by
    /// timestamp; sources guarantee this, and playback never re-sorts.
    pub fn new(records: Vec<MentionRecord>, period: Duration) -> Self {
        debug_assert!(
            records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp),
            "playback records must be sorted ascending by timestamp"
        );
        Self {
            records,
            cursor: 0,
            period,
            state: PlaybackState::Idle,
        }
    }

    /// Begin playback.
    ///
    /// An empty sequence stops immediately with zero emissions. Calling
    /// start on a running or stopped playback does nothing. Stopped is
    /// terminal.
    pub fn start(&mut self) {
        if self.state != PlaybackState::Idle {
            return;
        }
        if self.records.is_empty() {
            info!("playback source is empty, stopping with zero emissions");
            self.state = PlaybackState::Stopped;
        } else {
            info!(
                "playback started: {} records, one every {:?}",
                self.records.len(),
                self.period
            );
            self.state = PlaybackState::Running;
        }
    }

    /// Emit the next record.
    ///
    /// Returns `None` when the playback is not running, or on the tick
    /// that finds the cursor at the end; that tick transitions to
    /// Stopped and performs no emission.
    pub fn tick(&mut self) -> Option<MentionRecord> {
        if self.state != PlaybackState::Running {
            return None;
        }
        if self.cursor >= self.records.len() {
            info!("playback exhausted after {} records", self.cursor);
            self.state = PlaybackState::Stopped;
            return None;
        }
        let record = self.records[self.cursor].clone();
        self.cursor += 1;
        Some(record)
    }

    /// Cancel playback. Terminal from any state.
    pub fn cancel(&mut self) {
        if self.state == PlaybackState::Running {
            info!("playback cancelled at record {}", self.cursor);
        }
        self.state = PlaybackState::Stopped;
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Records emitted so far.
    pub fn emitted(&self) -> usize {
        self.cursor
    }

    /// Records still to emit.
    pub fn remaining(&self) -> usize {
        self.records.len() - self.cursor
    }
}

/// Spawn a task that drives `playback` on its fixed period, sending each
/// record to `tx`.
///
/// The interval's immediate first tick is skipped, so the first record
/// lands one full period after spawn. The task ends when the sequence
/// exhausts or the receiving side goes away; dropping the sender closes
/// the channel either way.
pub fn spawn_playback(
    mut playback: Playback,
    tx: mpsc::Sender<MentionRecord>,
) -> PlaybackHandle {
    let handle = tokio::spawn(async move {
        playback.start();

        let mut interval = tokio::time::interval(playback.period);
        // Skip the immediate first tick
        interval.tick().await;

        while playback.state() == PlaybackState::Running {
            interval.tick().await;
            match playback.tick() {
                Some(record) => {
                    if tx.send(record).await.is_err() {
                        debug!("playback stopping: channel closed");
                        playback.cancel();
                    }
                }
                None => break,
            }
        }
    });

    PlaybackHandle { handle }
}

/// Handle to a spawned playback task.
pub struct PlaybackHandle {
    handle: JoinHandle<()>,
}

impl PlaybackHandle {
    /// Abort the playback task. Emission stops without draining.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Wait for the playback task to finish.
    pub async fn join(self) -> Result<(), tokio::task::JoinError> {
        self.handle.await
    }
}
