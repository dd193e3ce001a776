//! # Playback Queue & Persistence
//!
//! Owns the now-playing queue and its durable snapshot.
//!
//! ## Overview
//!
//! This crate handles:
//! - Track descriptors and their stored, primitive-only form
//! - The queue, mirrored one-to-one into the host's playback engine
//! - Saving the queue and transport position on suspend and restoring both
//!   after a restart, including re-inserting sources the engine is missing

pub mod config;
pub mod coordinator;
pub mod error;
pub mod queue;
pub mod record;
pub mod track;
pub mod traits;

pub use config::SyncConfig;
pub use coordinator::{PersistReport, RestoreReport, SyncCoordinator, SyncState};
pub use error::{PlaybackError, Result};
pub use queue::{CatchUp, InsertOutcome, QueueManager};
pub use record::{PlaybackPosition, PositionRecord, QueueRecord, SerializedTrack, RECORD_VERSION};
pub use track::{ArtworkRef, TrackDescriptor, TrackId};
pub use traits::{DirectResolver, TrackResolver};
