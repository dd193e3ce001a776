//! Persist/restore tests
//!
//! Each "fresh process" is modelled as a new engine, queue and coordinator
//! sharing only the durable store.

mod common;

use async_trait::async_trait;
use bridge_desktop::SimulatedPlaybackEngine;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{MediaSource, PlaybackEngine};
use common::{direct_harness, harness, ids, playable, unplayable, MemoryStore};
use core_playback::{
    DirectResolver, PlaybackError, PositionRecord, QueueRecord, Result, SerializedTrack,
    SyncState, TrackDescriptor, TrackResolver,
};
use core_runtime::events::{CoreEvent, SyncEvent};
use mockall::mock;
use mockall::predicate::eq;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

mock! {
    pub Engine {}

    #[async_trait::async_trait]
    impl PlaybackEngine for Engine {
        async fn insert_source(&self, index: usize, source: &MediaSource) -> BridgeResult<()>;
        async fn clear_sources(&self) -> BridgeResult<()>;
        async fn source_count(&self) -> usize;
        async fn seek_to(&self, index: usize, offset_ms: u64) -> BridgeResult<()>;
        async fn current_index(&self) -> Option<usize>;
        async fn current_position_ms(&self) -> u64;
        async fn is_playing(&self) -> bool;
        async fn set_play_when_ready(&self, play_when_ready: bool) -> BridgeResult<()>;
    }
}

/// Persist `tracks` with the transport at `(index, offset)` from a synced session.
async fn seed_store(store: &Arc<MemoryStore>, tracks: &[&str], index: usize, offset_ms: u64, playing: bool) {
    let engine = Arc::new(SimulatedPlaybackEngine::new());
    let h = direct_harness(store.clone(), engine.clone());
    h.sync.restore().await;

    for id in tracks {
        h.queue.append(playable(id)).await.unwrap();
    }
    if !tracks.is_empty() {
        engine.advance_to(index, offset_ms).await.unwrap();
    }
    engine.set_play_when_ready(playing).await.unwrap();

    assert!(h.sync.persist().await.unwrap().is_complete());
}

#[tokio::test]
async fn restore_brings_back_queue_and_position() {
    let store = MemoryStore::new();
    seed_store(&store, &["a", "b"], 1, 4200, true).await;

    let mut engine = MockEngine::new();
    engine.expect_insert_source().times(2).returning(|_, _| Ok(()));
    engine.expect_source_count().returning(|| 2);
    engine
        .expect_seek_to()
        .with(eq(1), eq(4200))
        .times(1)
        .returning(|_, _| Ok(()));
    engine
        .expect_set_play_when_ready()
        .with(eq(true))
        .times(1)
        .returning(|_| Ok(()));

    let h = direct_harness(store.clone(), Arc::new(engine));
    let report = h.sync.restore().await;

    assert_eq!(ids(&h.queue.snapshot()), ["a", "b"]);
    assert_eq!(report.restored, 2);
    assert!(report.position_restored);
    assert_eq!(*h.sync.position_cursor().borrow(), 4200);
    assert_eq!(h.sync.state(), SyncState::Synced);
}

#[tokio::test]
async fn restore_without_records_touches_nothing() {
    let store = MemoryStore::new();

    // Any engine call would panic on the mock
    let h = direct_harness(store.clone(), Arc::new(MockEngine::new()));
    let report = h.sync.restore().await;

    assert!(h.queue.is_empty());
    assert_eq!(report.restored, 0);
    assert!(!report.position_restored);
    assert_eq!(h.sync.state(), SyncState::Synced);
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn persist_then_restore_round_trips_playable_tracks() {
    let store = MemoryStore::new();
    {
        let h = direct_harness(store.clone(), Arc::new(SimulatedPlaybackEngine::new()));
        h.sync.restore().await;
        for track in [playable("a"), unplayable("x"), playable("b"), playable("c")] {
            h.queue.append(track).await.unwrap();
        }
        h.queue.insert(0, playable("d")).await.unwrap();
        h.sync.persist().await.unwrap();
    }

    let engine = Arc::new(SimulatedPlaybackEngine::new());
    let h = direct_harness(store.clone(), engine.clone());
    h.sync.restore().await;

    assert_eq!(ids(&h.queue.snapshot()), ["d", "a", "b", "c"]);
    assert_eq!(engine.source_count().await, 4);
    assert_eq!(h.queue.snapshot()[1], playable("a"));
}

#[tokio::test]
async fn repeated_persist_is_idempotent() {
    let store = MemoryStore::new();
    let engine = Arc::new(SimulatedPlaybackEngine::new());
    let h = direct_harness(store.clone(), engine.clone());
    h.sync.restore().await;
    h.queue.append(playable("a")).await.unwrap();
    engine.advance_to(0, 1500).await.unwrap();

    h.sync.persist().await.unwrap();
    let first = store.snapshot();
    h.sync.persist().await.unwrap();

    assert_eq!(store.snapshot(), first);
    assert_eq!(first.len(), 2);
}

#[tokio::test]
async fn stored_records_never_hold_unplayable_tracks() {
    let store = MemoryStore::new();
    let h = direct_harness(store.clone(), Arc::new(SimulatedPlaybackEngine::new()));
    h.sync.restore().await;
    h.queue.append(unplayable("x")).await.unwrap();
    h.queue.append(playable("a")).await.unwrap();
    h.sync.persist().await.unwrap();

    let record = QueueRecord::decode(&store.get("playlist_0").unwrap()).unwrap();
    assert_eq!(record.tracks.len(), 1);
    assert!(record.tracks.iter().all(|t| t.media_url.is_some()));
}

#[tokio::test]
async fn stored_track_without_url_is_skipped_on_restore() {
    let store = MemoryStore::new();
    let record = QueueRecord {
        version: 1,
        tracks: vec![
            SerializedTrack::from(&playable("a")),
            SerializedTrack::from(&unplayable("x")),
            SerializedTrack::from(&playable("b")),
        ],
    };
    store.put("playlist_0", record.encode().unwrap());

    let h = direct_harness(store.clone(), Arc::new(SimulatedPlaybackEngine::new()));
    let report = h.sync.restore().await;

    assert_eq!(ids(&h.queue.snapshot()), ["a", "b"]);
    assert_eq!(report.skipped, 1);
}

#[tokio::test]
async fn corrupt_records_restore_as_empty() {
    let store = MemoryStore::new();
    store.put("playlist_0", &b"{not json"[..]);
    store.put("playlist_0_state", &br#"{"version":99,"index":3}"#[..]);

    let engine = Arc::new(SimulatedPlaybackEngine::new());
    let h = direct_harness(store.clone(), engine.clone());
    let report = h.sync.restore().await;

    assert!(h.queue.is_empty());
    assert_eq!(engine.source_count().await, 0);
    assert!(!report.position_restored);
    assert_eq!(h.sync.state(), SyncState::Synced);
}

#[tokio::test]
async fn position_outside_restored_queue_is_not_sought() {
    let store = MemoryStore::new();
    store.put(
        "playlist_0_state",
        PositionRecord {
            version: 1,
            index: Some(5),
            offset_ms: Some(9000),
            is_playing: true,
        }
        .encode()
        .unwrap(),
    );

    let mut engine = MockEngine::new();
    engine.expect_source_count().returning(|| 0);
    engine.expect_seek_to().never();
    engine
        .expect_set_play_when_ready()
        .with(eq(true))
        .times(1)
        .returning(|_| Ok(()));

    let h = direct_harness(store.clone(), Arc::new(engine));
    let report = h.sync.restore().await;

    assert!(report.position_restored);
    assert_eq!(*h.sync.position_cursor().borrow(), 0);
}

struct RejectingResolver {
    reject_id: &'static str,
}

#[async_trait]
impl TrackResolver for RejectingResolver {
    async fn resolve(&self, track: &SerializedTrack) -> Result<TrackDescriptor> {
        if track.id == self.reject_id {
            return Err(PlaybackError::ResolutionFailed {
                track_id: track.id.clone(),
                reason: "track removed from catalogue".into(),
            });
        }
        DirectResolver.resolve(track).await
    }
}

#[tokio::test]
async fn unresolvable_track_is_skipped() {
    let store = MemoryStore::new();
    seed_store(&store, &["a", "b", "c"], 0, 0, false).await;

    let h = harness(
        store.clone(),
        Arc::new(SimulatedPlaybackEngine::new()),
        Arc::new(RejectingResolver { reject_id: "b" }),
    );
    let report = h.sync.restore().await;

    assert_eq!(ids(&h.queue.snapshot()), ["a", "c"]);
    assert_eq!(report.restored, 2);
    assert_eq!(report.skipped, 1);
}

#[tokio::test]
async fn position_write_failure_does_not_block_queue_write() {
    let store = MemoryStore::new();
    store.fail_writes_to("playlist_0_state");

    let h = direct_harness(store.clone(), Arc::new(SimulatedPlaybackEngine::new()));
    let mut events = h.events.subscribe();
    h.sync.restore().await;
    h.queue.append(playable("a")).await.unwrap();

    let report = h.sync.persist().await.unwrap();

    assert!(report.queue.is_ok());
    assert!(report.position.as_ref().unwrap_err().is_store_error());
    assert!(store.get("playlist_0").is_some());
    assert!(store.get("playlist_0_state").is_none());

    let mut saw_failure = false;
    while let Ok(event) = events.try_recv() {
        if let CoreEvent::Sync(SyncEvent::PersistFailed { playlist_key, .. }) = event {
            assert_eq!(playlist_key, "playlist_0");
            saw_failure = true;
        }
    }
    assert!(saw_failure);
}

#[tokio::test]
async fn queue_write_failure_does_not_block_position_write() {
    let store = MemoryStore::new();
    store.fail_writes_to("playlist_0");

    let engine = Arc::new(SimulatedPlaybackEngine::new());
    let h = direct_harness(store.clone(), engine.clone());
    h.sync.restore().await;
    h.queue.append(playable("a")).await.unwrap();
    h.queue.append(playable("b")).await.unwrap();
    engine.advance_to(1, 2500).await.unwrap();

    let report = h.sync.persist().await.unwrap();

    assert!(report.queue.as_ref().unwrap_err().is_store_error());
    assert!(report.position.is_ok());
    assert!(store.get("playlist_0").is_none());

    let position = PositionRecord::decode(&store.get("playlist_0_state").unwrap()).unwrap();
    assert_eq!(position.index, Some(1));
    assert_eq!(position.offset_ms, Some(2500));
}

#[tokio::test]
async fn persist_racing_restore_never_stores_partial_queue() {
    let store = MemoryStore::new();
    seed_store(&store, &["a", "b", "c"], 2, 100, true).await;
    store.delay_reads(Duration::from_millis(30));

    let h = direct_harness(store.clone(), Arc::new(SimulatedPlaybackEngine::new()));
    let restore = h.sync.spawn_restore();
    tokio::task::yield_now().await;
    let persist = h.sync.spawn_persist();

    let restored = restore.await.unwrap();
    let persisted = persist.await.unwrap();

    assert_eq!(restored.restored, 3);
    if let Some(report) = persisted {
        assert_eq!(report.tracks, 3);
    }

    let record = QueueRecord::decode(&store.get("playlist_0").unwrap()).unwrap();
    assert_eq!(record.tracks.len(), 3);
}

/// Engine that silently drops the source inserted at `drop_index` once, and
/// optionally refuses the insert that follows.
struct ForgetfulEngine {
    inner: SimulatedPlaybackEngine,
    drop_index: usize,
    armed: AtomicBool,
    refuse_next: bool,
}

impl ForgetfulEngine {
    fn new(drop_index: usize, refuse_next: bool) -> Self {
        Self {
            inner: SimulatedPlaybackEngine::new(),
            drop_index,
            armed: AtomicBool::new(true),
            refuse_next,
        }
    }
}

#[async_trait]
impl PlaybackEngine for ForgetfulEngine {
    async fn insert_source(&self, index: usize, source: &MediaSource) -> BridgeResult<()> {
        if index == self.drop_index && self.armed.swap(false, Ordering::SeqCst) {
            if self.refuse_next {
                self.inner.reject_next_inserts(1).await;
            }
            return Ok(());
        }
        self.inner.insert_source(index, source).await
    }

    async fn clear_sources(&self) -> BridgeResult<()> {
        self.inner.clear_sources().await
    }

    async fn source_count(&self) -> usize {
        self.inner.source_count().await
    }

    async fn seek_to(&self, index: usize, offset_ms: u64) -> BridgeResult<()> {
        self.inner.seek_to(index, offset_ms).await
    }

    async fn current_index(&self) -> Option<usize> {
        self.inner.current_index().await
    }

    async fn current_position_ms(&self) -> u64 {
        self.inner.current_position_ms().await
    }

    async fn is_playing(&self) -> bool {
        self.inner.is_playing().await
    }

    async fn set_play_when_ready(&self, play_when_ready: bool) -> BridgeResult<()> {
        self.inner.set_play_when_ready(play_when_ready).await
    }
}

#[tokio::test]
async fn restore_catches_up_engine_tail() {
    let store = MemoryStore::new();
    seed_store(&store, &["a", "b"], 1, 3000, false).await;

    let engine = Arc::new(ForgetfulEngine::new(1, false));
    let h = direct_harness(store.clone(), engine.clone());
    let report = h.sync.restore().await;

    assert_eq!(report.restored, 2);
    assert_eq!(report.caught_up, 1);
    assert_eq!(engine.source_count().await, 2);
    assert_eq!(engine.current_index().await, Some(1));
    assert_eq!(engine.current_position_ms().await, 3000);
}

#[tokio::test]
async fn refused_catch_up_trims_queue_to_engine() {
    let store = MemoryStore::new();
    seed_store(&store, &["a", "b"], 1, 3000, true).await;

    let engine = Arc::new(ForgetfulEngine::new(1, true));
    let h = direct_harness(store.clone(), engine.clone());
    let report = h.sync.restore().await;

    assert_eq!(ids(&h.queue.snapshot()), ["a"]);
    assert_eq!(h.queue.len(), engine.source_count().await);
    assert_eq!(report.restored, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.caught_up, 0);

    // Stored index 1 no longer exists
    assert!(report.position_restored);
    assert_eq!(*h.sync.position_cursor().borrow(), 0);
    assert_eq!(h.sync.state(), SyncState::Synced);
}

#[tokio::test]
async fn aborted_restore_returns_to_unsynced() {
    let store = MemoryStore::new();
    seed_store(&store, &["a", "b"], 0, 0, false).await;
    store.delay_reads(Duration::from_millis(500));

    let h = direct_harness(store.clone(), Arc::new(SimulatedPlaybackEngine::new()));
    let mut state = h.sync.subscribe_state();
    let restore = h.sync.spawn_restore();

    state
        .wait_for(|s| *s == SyncState::Restoring)
        .await
        .unwrap();
    restore.abort();
    assert!(restore.await.unwrap_err().is_cancelled());

    assert_eq!(h.sync.state(), SyncState::Unsynced);
    assert!(h.sync.persist().await.is_none());

    store.delay_reads(Duration::ZERO);
    let report = h.sync.restore().await;
    assert_eq!(report.restored, 2);
    assert_eq!(h.sync.state(), SyncState::Synced);
}

#[tokio::test]
async fn restore_reports_progress_events() {
    let store = MemoryStore::new();
    seed_store(&store, &["a"], 0, 0, false).await;

    let h = direct_harness(store.clone(), Arc::new(SimulatedPlaybackEngine::new()));
    let mut events = h.events.subscribe();
    h.sync.restore().await;

    let sync_events: Vec<SyncEvent> = std::iter::from_fn(|| events.try_recv().ok())
        .filter_map(|event| match event {
            CoreEvent::Sync(e) => Some(e),
            _ => None,
        })
        .collect();

    assert_eq!(
        sync_events,
        vec![
            SyncEvent::RestoreStarted {
                playlist_key: "playlist_0".into()
            },
            SyncEvent::RestoreCompleted {
                playlist_key: "playlist_0".into(),
                restored: 1,
                skipped: 0,
                position_restored: true,
            },
        ]
    );
}

#[tokio::test]
async fn teardown_keeps_stored_records() {
    let store = MemoryStore::new();
    seed_store(&store, &["a", "b"], 0, 0, false).await;

    let engine = Arc::new(SimulatedPlaybackEngine::new());
    let h = direct_harness(store.clone(), engine.clone());
    h.sync.restore().await;
    h.sync.teardown().await.unwrap();

    assert!(h.queue.is_empty());
    assert_eq!(engine.source_count().await, 0);
    assert_eq!(h.sync.state(), SyncState::Unsynced);
    assert!(h.sync.persist().await.is_none());
    assert!(store.get("playlist_0").is_some());

    // A new lifecycle can restore again
    assert_eq!(h.sync.restore().await.restored, 2);
}
