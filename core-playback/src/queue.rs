//! # Queue Manager
//!
//! Owns the now-playing queue and keeps it mirrored one-to-one with the
//! playback engine's source list.
//!
//! Every mutation updates both sides under one lock and only then publishes
//! the new queue to observers, so nobody outside a mutation sees the two lists
//! disagree. A failed engine insert is rolled back out of the queue.

use crate::error::{PlaybackError, Result};
use crate::track::TrackDescriptor;
use bridge_traits::{MediaSource, PlaybackEngine};
use core_runtime::events::{CoreEvent, EventBus, QueueEvent};
use std::sync::Arc;
use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// What `insert` did with a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The track now sits at `index` in both the queue and the engine.
    Inserted { index: usize },
    /// The track has no media URL and was ignored.
    SkippedNotPlayable,
}

impl InsertOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted { .. })
    }
}

/// What `catch_up_engine` did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatchUp {
    /// Sources re-inserted into the engine.
    pub reinserted: usize,
    /// Queue entries removed because the engine refused their source.
    pub dropped: usize,
}

pub struct QueueManager {
    engine: Arc<dyn PlaybackEngine>,
    tracks: Mutex<Vec<TrackDescriptor>>,
    published: watch::Sender<Vec<TrackDescriptor>>,
    events: EventBus,
}

impl QueueManager {
    pub fn new(engine: Arc<dyn PlaybackEngine>, events: EventBus) -> Self {
        let (published, _) = watch::channel(Vec::new());
        Self {
            engine,
            tracks: Mutex::new(Vec::new()),
            published,
            events,
        }
    }

    /// Insert `track` at `index`, shifting later entries right.
    ///
    /// Tracks without a media URL are skipped and reported as
    /// [`InsertOutcome::SkippedNotPlayable`]. An `index` past the end of the
    /// queue is rejected. If the engine refuses the source, the queue is left
    /// exactly as it was and the engine error is returned.
    pub async fn insert(&self, index: usize, track: TrackDescriptor) -> Result<InsertOutcome> {
        let Some(source) = self.source_or_skip(&track) else {
            return Ok(InsertOutcome::SkippedNotPlayable);
        };

        let tracks = self.tracks.lock().await;
        self.insert_locked(tracks, index, track, source).await
    }

    /// Insert `track` at the end of the queue.
    pub async fn append(&self, track: TrackDescriptor) -> Result<InsertOutcome> {
        let Some(source) = self.source_or_skip(&track) else {
            return Ok(InsertOutcome::SkippedNotPlayable);
        };

        let tracks = self.tracks.lock().await;
        let index = tracks.len();
        self.insert_locked(tracks, index, track, source).await
    }

    fn source_or_skip(&self, track: &TrackDescriptor) -> Option<MediaSource> {
        let source = track.media_source();
        if source.is_none() {
            debug!(track_id = %track.id(), "Skipping track without media URL");
            self.events.emit(CoreEvent::Queue(QueueEvent::TrackSkipped {
                track_id: track.id().to_string(),
            }));
        }
        source
    }

    async fn insert_locked(
        &self,
        mut tracks: MutexGuard<'_, Vec<TrackDescriptor>>,
        index: usize,
        track: TrackDescriptor,
        source: MediaSource,
    ) -> Result<InsertOutcome> {
        if index > tracks.len() {
            return Err(PlaybackError::IndexOutOfBounds {
                index,
                len: tracks.len(),
            });
        }

        let track_id = track.id().to_string();
        tracks.insert(index, track);

        if let Err(e) = self.engine.insert_source(index, &source).await {
            tracks.remove(index);
            warn!(track_id = %track_id, index, error = %e, "Engine rejected source, rolled back");
            return Err(e.into());
        }

        let queue_len = tracks.len();
        self.published.send_replace(tracks.clone());
        drop(tracks);

        debug!(track_id = %track_id, index, queue_len, "Inserted track");
        self.events.emit(CoreEvent::Queue(QueueEvent::TrackInserted {
            track_id,
            index,
            queue_len,
        }));

        Ok(InsertOutcome::Inserted { index })
    }

    /// Empty both the engine source list and the queue.
    ///
    /// The engine is cleared first; if it fails the queue is untouched, so the
    /// two sides stay mirrored.
    pub async fn clear(&self) -> Result<()> {
        let mut tracks = self.tracks.lock().await;
        let removed = tracks.len();

        self.engine.clear_sources().await?;
        tracks.clear();
        self.published.send_replace(Vec::new());
        drop(tracks);

        info!(removed, "Cleared queue");
        self.events
            .emit(CoreEvent::Queue(QueueEvent::Cleared { removed }));
        Ok(())
    }

    /// Re-insert queue entries the engine is missing from its tail.
    ///
    /// If the engine refuses one of them, the queue is cut back to the entries
    /// the engine holds so the two sides stay mirrored; the cut entries are
    /// reported as `dropped`.
    pub async fn catch_up_engine(&self) -> CatchUp {
        let mut tracks = self.tracks.lock().await;
        let engine_count = self.engine.source_count().await;

        if engine_count > tracks.len() {
            warn!(
                engine_count,
                queue_len = tracks.len(),
                "Engine holds more sources than the queue"
            );
            return CatchUp::default();
        }

        let mut outcome = CatchUp::default();
        let mut failed_at = None;
        for (index, track) in tracks.iter().enumerate().skip(engine_count) {
            let Some(source) = track.media_source() else {
                continue;
            };
            if let Err(e) = self.engine.insert_source(index, &source).await {
                warn!(track_id = %track.id(), index, error = %e, "Engine refused catch-up source");
                failed_at = Some(index);
                break;
            }
            outcome.reinserted += 1;
        }

        if let Some(index) = failed_at {
            let dropped: Vec<_> = tracks.drain(index..).collect();
            outcome.dropped = dropped.len();
            self.published.send_replace(tracks.clone());
            drop(tracks);

            warn!(dropped = outcome.dropped, queue_len = index, "Truncated queue to engine sources");
            for track in dropped {
                self.events.emit(CoreEvent::Queue(QueueEvent::TrackSkipped {
                    track_id: track.id().to_string(),
                }));
            }
        }

        if outcome.reinserted > 0 {
            info!(reinserted = outcome.reinserted, "Engine caught up with queue");
        }
        outcome
    }

    /// Current queue contents.
    pub fn snapshot(&self) -> Vec<TrackDescriptor> {
        self.published.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.published.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.published.borrow().is_empty()
    }

    /// Observe the queue. The receiver always holds the latest contents.
    pub fn subscribe(&self) -> watch::Receiver<Vec<TrackDescriptor>> {
        self.published.subscribe()
    }
}

impl std::fmt::Debug for QueueManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueManager")
            .field("len", &self.len())
            .finish()
    }
}
