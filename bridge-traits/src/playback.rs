//! Playback engine bridge trait and media source types.
//!
//! The host owns a native media engine (ExoPlayer, AVQueuePlayer, a desktop
//! mixer, ...) that keeps its own ordered list of media sources plus transport
//! state. The core never touches that list except through
//! [`PlaybackEngine`], and only the queue manager calls the source-list
//! mutators.

use crate::error::Result;
use std::path::PathBuf;
use url::Url;

/// Engine-side media source derived from a track's URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// Local file accessible to the host runtime.
    LocalFile { path: PathBuf },
    /// Remote HTTP(S) (or any non-file scheme) stream fetched by the host.
    RemoteStream { url: Url },
}

impl MediaSource {
    /// Build the source for a track URL.
    ///
    /// `file://` URLs that map to a filesystem path become
    /// [`MediaSource::LocalFile`]; everything else is handed to the engine as
    /// a remote stream.
    pub fn from_url(url: &Url) -> Self {
        if url.scheme() == "file" {
            if let Ok(path) = url.to_file_path() {
                return MediaSource::LocalFile { path };
            }
        }
        MediaSource::RemoteStream { url: url.clone() }
    }

    /// Determine whether the source represents remote content.
    pub fn is_remote(&self) -> bool {
        matches!(self, MediaSource::RemoteStream { .. })
    }
}

/// Trait for platform playback engines that maintain an ordered source list.
///
/// Indices are zero-based positions in the engine's source list. Inserting at
/// index `i` shifts every source at `i..` one position to the right.
#[async_trait::async_trait]
pub trait PlaybackEngine: Send + Sync {
    /// Insert a media source at `index` (`index == source_count()` appends).
    async fn insert_source(&self, index: usize, source: &MediaSource) -> Result<()>;

    /// Remove every source from the engine.
    async fn clear_sources(&self) -> Result<()>;

    /// Number of sources currently loaded.
    async fn source_count(&self) -> usize;

    /// Move the transport to `offset_ms` within the source at `index`.
    async fn seek_to(&self, index: usize, offset_ms: u64) -> Result<()>;

    /// Index of the current source, if the engine has one selected.
    async fn current_index(&self) -> Option<usize>;

    /// Playback position within the current source, in milliseconds.
    async fn current_position_ms(&self) -> u64;

    /// Whether the engine is actively playing.
    async fn is_playing(&self) -> bool;

    /// Start playback as soon as the current source is ready (or pause when `false`).
    async fn set_play_when_ready(&self, play_when_ready: bool) -> Result<()>;
}
