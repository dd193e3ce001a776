//! # Core Configuration Module
//!
//! Provides configuration management for the player core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the injected host bridges and the persistence settings.
//! It enforces fail-fast validation so a session is never started against a
//! missing engine or an unusable store key.
//!
//! ## Required Dependencies
//!
//! - `PlaybackEngine` - The native engine whose source list mirrors the queue
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `DurableStore` - Queue/position snapshots (desktop default: files under `data_dir/playlists`)
//! - `LifecycleObserver` - App lifecycle stream that triggers persistence
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .playback_engine(Arc::new(MyEngine::new()))
//!     .durable_store(Arc::new(MyStore::new()))
//!     .playlist_key("playlist_0")
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // No playback engine was injected
//! let config = CoreConfig::builder()
//!     .data_dir("/tmp/pocket-music")
//!     .build()
//!     .expect("Should fail - missing playback engine");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{DurableStore, LifecycleObserver, PlaybackEngine};
use std::path::PathBuf;
use std::sync::Arc;

/// Logical identity of the single persisted playlist.
pub const DEFAULT_PLAYLIST_KEY: &str = "playlist_0";

/// Suffix appended to the playlist key for the playback-position record.
pub const STATE_KEY_SUFFIX: &str = "_state";

/// Sub-directory of `data_dir` used by the default durable store.
pub const PLAYLIST_STORE_DIR: &str = "playlists";

/// Core configuration for the player core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Native playback engine (required)
    pub playback_engine: Arc<dyn PlaybackEngine>,

    /// Durable blob store for queue and position snapshots
    pub durable_store: Arc<dyn DurableStore>,

    /// App lifecycle observer (optional)
    pub lifecycle_observer: Option<Arc<dyn LifecycleObserver>>,

    /// Key of the queue record; the position record lives under `<key>_state`
    pub playlist_key: String,

    /// Buffer size of the event bus
    pub event_buffer_size: usize,

    /// Persist whenever the host reports `LifecycleState::Background`
    pub persist_on_background: bool,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("playback_engine", &"PlaybackEngine { ... }")
            .field("durable_store", &"DurableStore { ... }")
            .field(
                "lifecycle_observer",
                &self
                    .lifecycle_observer
                    .as_ref()
                    .map(|_| "LifecycleObserver { ... }"),
            )
            .field("playlist_key", &self.playlist_key)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("persist_on_background", &self.persist_on_background)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Key of the playback-position record.
    pub fn state_key(&self) -> String {
        format!("{}{}", self.playlist_key, STATE_KEY_SUFFIX)
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Playlist key is not empty and contains no path separators
    /// - Event buffer size is greater than zero
    pub fn validate(&self) -> Result<()> {
        validate_playlist_key(&self.playlist_key)?;

        if self.event_buffer_size == 0 {
            return Err(Error::InvalidValue {
                field: "event_buffer_size",
                message: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

fn validate_playlist_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(Error::InvalidValue {
            field: "playlist_key",
            message: "cannot be empty".to_string(),
        });
    }

    if key.contains('/') || key.contains('\\') {
        return Err(Error::InvalidValue {
            field: "playlist_key",
            message: format!("'{}' must not contain path separators", key),
        });
    }

    Ok(())
}

fn playback_engine_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "PlaybackEngine".to_string(),
        message: "A PlaybackEngine implementation is required to mirror the queue. \
                 Android: wrap ExoPlayer. iOS: wrap AVQueuePlayer. \
                 Desktop/tests: use bridge_desktop::SimulatedPlaybackEngine."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_durable_store(data_dir: Option<PathBuf>) -> Result<Arc<dyn DurableStore>> {
    use bridge_desktop::FileDurableStore;

    let store = match data_dir {
        Some(dir) => FileDurableStore::new(dir.join(PLAYLIST_STORE_DIR)),
        None => FileDurableStore::in_default_location(PLAYLIST_STORE_DIR),
    };

    let store: Arc<dyn DurableStore> = Arc::new(store);
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_durable_store(_data_dir: Option<PathBuf>) -> Result<Arc<dyn DurableStore>> {
    Err(Error::CapabilityMissing {
        capability: "DurableStore".to_string(),
        message: "DurableStore implementation is required for queue persistence. \
                 Desktop: enable the 'desktop-shims' feature to use FileDurableStore. \
                 Mobile: inject a store rooted in the app's private no-backup directory."
            .to_string(),
    })
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    playback_engine: Option<Arc<dyn PlaybackEngine>>,
    durable_store: Option<Arc<dyn DurableStore>>,
    lifecycle_observer: Option<Arc<dyn LifecycleObserver>>,
    data_dir: Option<PathBuf>,
    playlist_key: Option<String>,
    event_buffer_size: Option<usize>,
    persist_on_background: Option<bool>,
}

impl CoreConfigBuilder {
    /// Sets the playback engine the queue is mirrored into.
    pub fn playback_engine(mut self, engine: Arc<dyn PlaybackEngine>) -> Self {
        self.playback_engine = Some(engine);
        self
    }

    /// Sets a custom durable store implementation.
    pub fn durable_store(mut self, store: Arc<dyn DurableStore>) -> Self {
        self.durable_store = Some(store);
        self
    }

    /// Sets the lifecycle observer whose transitions trigger persistence.
    pub fn lifecycle_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.lifecycle_observer = Some(observer);
        self
    }

    /// Sets the application data directory used by the default store.
    ///
    /// Ignored when a custom [`durable_store`](Self::durable_store) is set.
    pub fn data_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Sets the logical playlist key (default `playlist_0`).
    pub fn playlist_key(mut self, key: impl Into<String>) -> Self {
        self.playlist_key = Some(key.into());
        self
    }

    /// Sets the event bus buffer size (default 100).
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Enables or disables persisting on `LifecycleState::Background` (default on).
    pub fn persist_on_background(mut self, enabled: bool) -> Self {
        self.persist_on_background = Some(enabled);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - No playback engine was injected
    /// - No durable store was injected and no default is available
    /// - Configuration values are invalid
    pub fn build(self) -> Result<CoreConfig> {
        let playback_engine = self
            .playback_engine
            .ok_or_else(playback_engine_missing_error)?;

        let durable_store = match self.durable_store {
            Some(store) => store,
            None => provide_default_durable_store(self.data_dir)?,
        };

        let config = CoreConfig {
            playback_engine,
            durable_store,
            lifecycle_observer: self.lifecycle_observer,
            playlist_key: self
                .playlist_key
                .unwrap_or_else(|| DEFAULT_PLAYLIST_KEY.to_string()),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            persist_on_background: self.persist_on_background.unwrap_or(true),
        };

        config.validate()?;

        Ok(config)
    }
}
