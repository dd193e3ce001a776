//! # Sync Coordinator
//!
//! Saves the queue and the transport position to the durable store, and
//! rebuilds both from it after a restart.
//!
//! ## State machine
//!
//! ```text
//! Unsynced --restore--> Restoring --> Synced --persist (repeatable)--> Synced
//!     ^                                                                  |
//!     +---------------------------- teardown ----------------------------+
//! ```
//!
//! `persist` only writes while `Synced`, so a session whose restore has not
//! run yet cannot overwrite the stored playlist with an empty queue.
//! `persist`, `restore` and `teardown` share one lock and never interleave.
//! A restore that is dropped before finishing goes back to `Unsynced`.
//!
//! ## Failure model
//!
//! Reads never fail a restore: a missing, unreadable or wrong-version record
//! is treated as "nothing stored". Writes are best-effort and independent per
//! record; the outcome of each is reported in a [`PersistReport`] and logged,
//! never raised to the UI.

use crate::config::SyncConfig;
use crate::error::{PlaybackError, Result};
use crate::queue::{InsertOutcome, QueueManager};
use crate::record::{PlaybackPosition, PositionRecord, QueueRecord};
use crate::traits::TrackResolver;
use bridge_traits::{DurableStore, PlaybackEngine};
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Where the coordinator is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Unsynced,
    Restoring,
    Synced,
}

/// Outcome of one `persist` call. Each record is written independently.
#[derive(Debug)]
pub struct PersistReport {
    /// Number of tracks in the written queue snapshot.
    pub tracks: usize,
    pub queue: Result<()>,
    pub position: Result<()>,
}

impl PersistReport {
    /// Both records were written.
    pub fn is_complete(&self) -> bool {
        self.queue.is_ok() && self.position.is_ok()
    }
}

/// Outcome of one `restore` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Tracks in the queue once restore finished.
    pub restored: usize,
    /// Stored tracks that could not be resolved, were not playable, or were
    /// refused by the engine.
    pub skipped: usize,
    /// Sources re-inserted into the engine after the appends.
    pub caught_up: usize,
    /// Whether a position record was found and applied.
    pub position_restored: bool,
}

pub struct SyncCoordinator {
    config: SyncConfig,
    store: Arc<dyn DurableStore>,
    engine: Arc<dyn PlaybackEngine>,
    queue: Arc<QueueManager>,
    resolver: Arc<dyn TrackResolver>,
    events: EventBus,
    io_lock: Mutex<()>,
    state: watch::Sender<SyncState>,
    cursor: watch::Sender<u64>,
}

impl SyncCoordinator {
    pub fn new(
        config: SyncConfig,
        store: Arc<dyn DurableStore>,
        engine: Arc<dyn PlaybackEngine>,
        queue: Arc<QueueManager>,
        resolver: Arc<dyn TrackResolver>,
        events: EventBus,
    ) -> Self {
        let (state, _) = watch::channel(SyncState::Unsynced);
        let (cursor, _) = watch::channel(0);

        Self {
            config,
            store,
            engine,
            queue,
            resolver,
            events,
            io_lock: Mutex::new(()),
            state,
            cursor,
        }
    }

    pub fn state(&self) -> SyncState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    /// UI-visible playback position in milliseconds.
    pub fn position_cursor(&self) -> watch::Receiver<u64> {
        self.cursor.subscribe()
    }

    /// Move the UI-visible position, e.g. while the user drags a seek bar.
    pub fn set_position_cursor(&self, offset_ms: u64) {
        self.cursor.send_replace(offset_ms);
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Write the queue and the current transport position.
    ///
    /// Returns `None` when skipped because the coordinator is not `Synced`.
    #[instrument(skip(self), fields(playlist_key = %self.config.playlist_key))]
    pub async fn persist(&self) -> Option<PersistReport> {
        let _io = self.io_lock.lock().await;

        let state = self.state();
        if state != SyncState::Synced {
            debug!(?state, "Skipping persist before restore");
            return None;
        }

        let tracks = self.queue.snapshot();
        let queue_key = self.config.playlist_key.clone();
        let queue = self
            .write_record(&queue_key, QueueRecord::from_tracks(&tracks).encode())
            .await;

        let position = PlaybackPosition::capture(self.engine.as_ref()).await;
        let state_key = self.config.state_key();
        let position_result = self
            .write_record(&state_key, PositionRecord::from(position).encode())
            .await;

        let report = PersistReport {
            tracks: tracks.len(),
            queue,
            position: position_result,
        };

        if report.is_complete() {
            info!(tracks = report.tracks, ?position, "Persisted queue");
            self.events.emit(CoreEvent::Sync(SyncEvent::PersistCompleted {
                playlist_key: queue_key,
                tracks: report.tracks,
            }));
        } else {
            for err in [&report.queue, &report.position]
                .into_iter()
                .filter_map(|r| r.as_ref().err())
            {
                warn!(error = %err, "Persist failed");
                self.events.emit(CoreEvent::Sync(SyncEvent::PersistFailed {
                    playlist_key: queue_key.clone(),
                    message: err.to_string(),
                }));
            }
        }

        Some(report)
    }

    async fn write_record(&self, key: &str, encoded: Result<bytes::Bytes>) -> Result<()> {
        let bytes = encoded?;
        self.store
            .write(key, bytes)
            .await
            .map_err(|e| PlaybackError::store(key, e))
    }

    /// Rebuild the queue and transport position from the store.
    ///
    /// Only runs from `Unsynced`; later calls return an empty report. Never
    /// fails: anything unreadable is treated as absent.
    #[instrument(skip(self), fields(playlist_key = %self.config.playlist_key))]
    pub async fn restore(&self) -> RestoreReport {
        let _io = self.io_lock.lock().await;

        if self.state() != SyncState::Unsynced {
            debug!(state = ?self.state(), "Restore already ran");
            return RestoreReport::default();
        }

        self.state.send_replace(SyncState::Restoring);
        let _restoring = RestoringGuard(&self.state);
        self.events.emit(CoreEvent::Sync(SyncEvent::RestoreStarted {
            playlist_key: self.config.playlist_key.clone(),
        }));

        let mut report = RestoreReport::default();

        if let Some(record) = self
            .read_record(&self.config.playlist_key, QueueRecord::decode)
            .await
        {
            for stored in &record.tracks {
                let track = match self.resolver.resolve(stored).await {
                    Ok(track) => track,
                    Err(e) => {
                        warn!(track_id = %stored.id, error = %e, "Skipping unresolvable track");
                        report.skipped += 1;
                        continue;
                    }
                };

                match self.queue.append(track).await {
                    Ok(InsertOutcome::Inserted { .. }) => report.restored += 1,
                    Ok(InsertOutcome::SkippedNotPlayable) => report.skipped += 1,
                    Err(e) => {
                        warn!(track_id = %stored.id, error = %e, "Failed to restore track");
                        report.skipped += 1;
                    }
                }
            }

            let catch_up = self.queue.catch_up_engine().await;
            report.caught_up = catch_up.reinserted;
            report.restored = report.restored.saturating_sub(catch_up.dropped);
            report.skipped += catch_up.dropped;
        }

        if let Some(record) = self
            .read_record(&self.config.state_key(), PositionRecord::decode)
            .await
        {
            self.apply_position(PlaybackPosition::from(record)).await;
            report.position_restored = true;
        }

        self.state.send_replace(SyncState::Synced);
        info!(
            restored = report.restored,
            skipped = report.skipped,
            position_restored = report.position_restored,
            "Restore complete"
        );
        self.events.emit(CoreEvent::Sync(SyncEvent::RestoreCompleted {
            playlist_key: self.config.playlist_key.clone(),
            restored: report.restored,
            skipped: report.skipped,
            position_restored: report.position_restored,
        }));

        report
    }

    async fn read_record<T>(&self, key: &str, decode: fn(&[u8]) -> Result<T>) -> Option<T> {
        let bytes = match self.store.read_or_none(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(key, "No stored record");
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "Unreadable record treated as absent");
                return None;
            }
        };

        match decode(bytes.as_ref()) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(key, error = %e, "Corrupt record treated as absent");
                None
            }
        }
    }

    async fn apply_position(&self, position: PlaybackPosition) {
        let (index, offset_ms) = position.seek_target();
        let source_count = self.engine.source_count().await;

        if index < source_count {
            if let Err(e) = self.engine.seek_to(index, offset_ms).await {
                warn!(index, offset_ms, error = %e, "Engine refused restored position");
            }
            self.cursor.send_replace(offset_ms);
        } else {
            warn!(index, source_count, "Stored position is outside the restored queue");
            self.cursor.send_replace(0);
        }

        if let Err(e) = self.engine.set_play_when_ready(position.is_playing).await {
            warn!(error = %e, "Engine refused play-when-ready");
        }
    }

    /// Clear queue and engine and return to `Unsynced`.
    ///
    /// Stored records are kept so the next session can restore them.
    #[instrument(skip(self), fields(playlist_key = %self.config.playlist_key))]
    pub async fn teardown(&self) -> Result<()> {
        let _io = self.io_lock.lock().await;

        let cleared = self.queue.clear().await;
        self.cursor.send_replace(0);
        self.state.send_replace(SyncState::Unsynced);

        if let Err(e) = &cleared {
            warn!(error = %e, "Engine failed to clear during teardown");
        }
        cleared
    }

    /// Run `persist` on a background task.
    pub fn spawn_persist(self: &Arc<Self>) -> JoinHandle<Option<PersistReport>> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move { coordinator.persist().await })
    }

    /// Run `restore` on a background task.
    pub fn spawn_restore(self: &Arc<Self>) -> JoinHandle<RestoreReport> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move { coordinator.restore().await })
    }
}

/// Returns the state to `Unsynced` if a restore is dropped mid-flight, e.g.
/// when its task is aborted. The queue keeps whatever was appended so far.
struct RestoringGuard<'a>(&'a watch::Sender<SyncState>);

impl Drop for RestoringGuard<'_> {
    fn drop(&mut self) {
        let reset = self.0.send_if_modified(|state| {
            if *state == SyncState::Restoring {
                *state = SyncState::Unsynced;
                true
            } else {
                false
            }
        });
        if reset {
            warn!("Restore abandoned, back to unsynced");
        }
    }
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}
