//! Simulated Playback Engine
//!
//! An in-memory stand-in for a native media engine. It keeps the ordered
//! source list and transport state the way ExoPlayer or AVQueuePlayer would,
//! without decoding anything. Used by the desktop shell and by tests.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    playback::{MediaSource, PlaybackEngine},
};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Default)]
struct EngineState {
    sources: Vec<MediaSource>,
    current_index: Option<usize>,
    position_ms: u64,
    play_when_ready: bool,
    reject_inserts: usize,
}

/// In-memory playback engine
#[derive(Debug, Default)]
pub struct SimulatedPlaybackEngine {
    state: Mutex<EngineState>,
}

impl SimulatedPlaybackEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the loaded sources, in order.
    pub async fn sources(&self) -> Vec<MediaSource> {
        self.state.lock().await.sources.clone()
    }

    /// Whether playback will start once the current source is ready.
    pub async fn play_when_ready(&self) -> bool {
        self.state.lock().await.play_when_ready
    }

    /// Simulate the transport advancing to `offset_ms` within the source at `index`.
    pub async fn advance_to(&self, index: usize, offset_ms: u64) -> Result<()> {
        self.seek_to(index, offset_ms).await
    }

    /// Make the next `count` calls to `insert_source` fail.
    pub async fn reject_next_inserts(&self, count: usize) {
        self.state.lock().await.reject_inserts = count;
    }
}

#[async_trait]
impl PlaybackEngine for SimulatedPlaybackEngine {
    async fn insert_source(&self, index: usize, source: &MediaSource) -> Result<()> {
        let mut state = self.state.lock().await;

        if state.reject_inserts > 0 {
            state.reject_inserts -= 1;
            return Err(BridgeError::EngineRejected(
                "simulated source rejection".to_string(),
            ));
        }

        if index > state.sources.len() {
            return Err(BridgeError::EngineRejected(format!(
                "insert index {} beyond {} sources",
                index,
                state.sources.len()
            )));
        }

        state.sources.insert(index, source.clone());

        // The current item keeps playing when something is inserted before it
        state.current_index = match state.current_index {
            None => Some(0),
            Some(current) if index <= current => Some(current + 1),
            Some(current) => Some(current),
        };

        debug!(index, count = state.sources.len(), "Inserted media source");
        Ok(())
    }

    async fn clear_sources(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let removed = state.sources.len();

        state.sources.clear();
        state.current_index = None;
        state.position_ms = 0;

        debug!(removed, "Cleared media sources");
        Ok(())
    }

    async fn source_count(&self) -> usize {
        self.state.lock().await.sources.len()
    }

    async fn seek_to(&self, index: usize, offset_ms: u64) -> Result<()> {
        let mut state = self.state.lock().await;

        if index >= state.sources.len() {
            return Err(BridgeError::EngineRejected(format!(
                "seek index {} beyond {} sources",
                index,
                state.sources.len()
            )));
        }

        state.current_index = Some(index);
        state.position_ms = offset_ms;
        Ok(())
    }

    async fn current_index(&self) -> Option<usize> {
        self.state.lock().await.current_index
    }

    async fn current_position_ms(&self) -> u64 {
        self.state.lock().await.position_ms
    }

    async fn is_playing(&self) -> bool {
        let state = self.state.lock().await;
        state.play_when_ready && !state.sources.is_empty()
    }

    async fn set_play_when_ready(&self, play_when_ready: bool) -> Result<()> {
        self.state.lock().await.play_when_ready = play_when_ready;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn local(name: &str) -> MediaSource {
        MediaSource::LocalFile {
            path: PathBuf::from(format!("/music/{name}.mp3")),
        }
    }

    #[tokio::test]
    async fn test_insert_keeps_current_item() {
        let engine = SimulatedPlaybackEngine::new();
        assert_eq!(engine.current_index().await, None);

        engine.insert_source(0, &local("a")).await.unwrap();
        engine.insert_source(1, &local("b")).await.unwrap();
        engine.seek_to(1, 500).await.unwrap();

        engine.insert_source(0, &local("c")).await.unwrap();
        assert_eq!(engine.current_index().await, Some(2));
        assert_eq!(engine.sources().await[2], local("b"));
    }

    #[tokio::test]
    async fn test_out_of_range_insert_rejected() {
        let engine = SimulatedPlaybackEngine::new();
        let err = engine.insert_source(1, &local("a")).await.unwrap_err();
        assert!(matches!(err, BridgeError::EngineRejected(_)));
        assert_eq!(engine.source_count().await, 0);
    }

    #[tokio::test]
    async fn test_rejection_injection() {
        let engine = SimulatedPlaybackEngine::new();
        engine.reject_next_inserts(1).await;

        assert!(engine.insert_source(0, &local("a")).await.is_err());
        assert!(engine.insert_source(0, &local("a")).await.is_ok());
    }

    #[tokio::test]
    async fn test_clear_resets_transport() {
        let engine = SimulatedPlaybackEngine::new();
        engine.insert_source(0, &local("a")).await.unwrap();
        engine.advance_to(0, 42_000).await.unwrap();
        engine.set_play_when_ready(true).await.unwrap();
        assert!(engine.is_playing().await);

        engine.clear_sources().await.unwrap();
        assert_eq!(engine.source_count().await, 0);
        assert_eq!(engine.current_index().await, None);
        assert_eq!(engine.current_position_ms().await, 0);
        assert!(!engine.is_playing().await);
    }

    #[tokio::test]
    async fn test_seek_past_end_rejected() {
        let engine = SimulatedPlaybackEngine::new();
        engine.insert_source(0, &local("a")).await.unwrap();
        assert!(engine.seek_to(1, 0).await.is_err());
    }
}
