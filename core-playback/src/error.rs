//! # Playback Error Types
//!
//! Error types for queue mutation and queue persistence.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during queue and persistence operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Queue Errors
    // ========================================================================
    /// Insert position lies past the end of the queue.
    #[error("Queue index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// The playback engine refused a source or transport command.
    #[error("Playback engine error: {0}")]
    Engine(#[from] BridgeError),

    // ========================================================================
    // Persistence Errors
    // ========================================================================
    /// The durable store failed to read or write a record.
    #[error("Durable store error for '{key}': {source}")]
    Store {
        key: String,
        #[source]
        source: BridgeError,
    },

    /// A record could not be encoded or decoded.
    #[error("Record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored record was written with an incompatible schema.
    #[error("Unsupported record version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// A stored track could not be turned back into a playable descriptor.
    #[error("Failed to resolve track {track_id}: {reason}")]
    ResolutionFailed { track_id: String, reason: String },

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    pub(crate) fn store(key: &str, source: BridgeError) -> Self {
        PlaybackError::Store {
            key: key.to_string(),
            source,
        }
    }

    /// Returns `true` if a stored record should be treated as absent.
    pub fn is_unreadable_record(&self) -> bool {
        matches!(
            self,
            PlaybackError::Serialization(_) | PlaybackError::UnsupportedVersion { .. }
        )
    }

    /// Returns `true` if this error came from the durable store.
    pub fn is_store_error(&self) -> bool {
        matches!(self, PlaybackError::Store { .. })
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
