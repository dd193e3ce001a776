//! Shared fixtures for core-playback integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{DurableStore, PlaybackEngine};
use bytes::Bytes;
use core_playback::{
    DirectResolver, QueueManager, SyncConfig, SyncCoordinator, TrackDescriptor, TrackId,
    TrackResolver,
};
use core_runtime::events::EventBus;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

pub fn playable(id: &str) -> TrackDescriptor {
    TrackDescriptor::new(TrackId::new(id), format!("Track {id}"), "Artist")
        .with_media_url(Url::parse(&format!("https://cdn.example.com/{id}.mp3")).unwrap())
}

pub fn unplayable(id: &str) -> TrackDescriptor {
    TrackDescriptor::new(TrackId::new(id), format!("Track {id}"), "Artist")
}

pub fn ids(tracks: &[TrackDescriptor]) -> Vec<String> {
    tracks.iter().map(|t| t.id().to_string()).collect()
}

/// In-memory store with optional read delay and per-key write failures.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Bytes>>,
    failing_keys: Mutex<HashSet<String>>,
    read_delay: Mutex<Option<Duration>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn put(&self, key: &str, value: impl Into<Bytes>) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.into());
    }

    pub fn snapshot(&self) -> HashMap<String, Bytes> {
        self.values.lock().unwrap().clone()
    }

    pub fn fail_writes_to(&self, key: &str) {
        self.failing_keys.lock().unwrap().insert(key.to_string());
    }

    pub fn delay_reads(&self, delay: Duration) {
        *self.read_delay.lock().unwrap() = Some(delay);
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn root_directory(&self) -> BridgeResult<PathBuf> {
        Ok(PathBuf::from("/memory/playlists"))
    }

    async fn write(&self, key: &str, value: Bytes) -> BridgeResult<()> {
        if self.failing_keys.lock().unwrap().contains(key) {
            return Err(BridgeError::OperationFailed(format!("write to {key} failed")));
        }
        self.put(key, value);
        Ok(())
    }

    async fn read_or_none(&self, key: &str) -> BridgeResult<Option<Bytes>> {
        let delay = *self.read_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.get(key))
    }

    async fn delete(&self, key: &str) -> BridgeResult<()> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

pub struct Harness {
    pub queue: Arc<QueueManager>,
    pub sync: Arc<SyncCoordinator>,
    pub events: EventBus,
}

pub fn harness(
    store: Arc<dyn DurableStore>,
    engine: Arc<dyn PlaybackEngine>,
    resolver: Arc<dyn TrackResolver>,
) -> Harness {
    let events = EventBus::new(64);
    let queue = Arc::new(QueueManager::new(engine.clone(), events.clone()));
    let sync = Arc::new(SyncCoordinator::new(
        SyncConfig::default(),
        store,
        engine,
        queue.clone(),
        resolver,
        events.clone(),
    ));

    Harness {
        queue,
        sync,
        events,
    }
}

pub fn direct_harness(store: Arc<dyn DurableStore>, engine: Arc<dyn PlaybackEngine>) -> Harness {
    harness(store, engine, Arc::new(DirectResolver))
}
