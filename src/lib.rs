//! Workspace entry crate.
//!
//! Host applications can depend on `pocket-music` and enable the documented
//! features instead of wiring `core-service`, `core-playback` and the bridge
//! crates individually.

#[cfg(feature = "desktop-shims")]
pub use core_playback::{QueueManager, SyncCoordinator, TrackDescriptor, TrackId};
#[cfg(feature = "desktop-shims")]
pub use core_service::{CoreError, PlayerSession, Result};
