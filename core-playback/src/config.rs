//! # Sync Configuration
//!
//! Identity of the persisted playlist.

use core_runtime::config::{DEFAULT_PLAYLIST_KEY, STATE_KEY_SUFFIX};
use serde::{Deserialize, Serialize};

/// Settings for the [`SyncCoordinator`](crate::SyncCoordinator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Key of the queue record in the durable store.
    ///
    /// Default: `playlist_0`.
    #[serde(default = "default_playlist_key")]
    pub playlist_key: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            playlist_key: default_playlist_key(),
        }
    }
}

impl SyncConfig {
    pub fn new(playlist_key: impl Into<String>) -> Self {
        Self {
            playlist_key: playlist_key.into(),
        }
    }

    /// Key of the playback-position record.
    pub fn state_key(&self) -> String {
        format!("{}{}", self.playlist_key, STATE_KEY_SUFFIX)
    }
}

fn default_playlist_key() -> String {
    DEFAULT_PLAYLIST_KEY.to_string()
}
