//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback core and the
//! platform-specific pieces it drives but does not own: the native media
//! engine, the durable blob store and the application lifecycle. Each trait
//! represents a capability the core requires but that must be implemented
//! differently per platform (desktop, iOS, Android).
//!
//! ## Traits
//!
//! ### Persistence
//! - [`DurableStore`](storage::DurableStore) - Key-addressed byte blobs that survive restarts
//!
//! ### Playback
//! - [`PlaybackEngine`](playback::PlaybackEngine) - Native engine owning an ordered media-source list
//!
//! ### Platform Integration
//! - [`LifecycleObserver`](background::LifecycleObserver) - App foreground/background/terminate transitions
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ In Progress |
//! | iOS      | TBD                 | 📋 Planned |
//! | Android  | TBD                 | 📋 Planned |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type for consistent
//! error handling. Platform implementations should:
//!
//! - Convert platform-specific errors to `BridgeError`
//! - Provide actionable error messages
//! - Include error context (e.g., store key, engine index)
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds so the core can drive them
//! from background tasks. Implementations must ensure thread safety.
//!
//! ## Examples
//!
//! ### Implementing DurableStore
//!
//! ```ignore
//! use bridge_traits::storage::DurableStore;
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//! use bytes::Bytes;
//!
//! pub struct SharedPreferencesStore { /* JNI handle */ }
//!
//! #[async_trait]
//! impl DurableStore for SharedPreferencesStore {
//!     async fn write(&self, key: &str, value: Bytes) -> Result<()> {
//!         todo!()
//!     }
//!     // ...
//! }
//! ```

pub mod background;
pub mod error;
pub mod logging;
pub mod playback;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use background::{LifecycleChangeStream, LifecycleObserver, LifecycleState};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use playback::{MediaSource, PlaybackEngine};
pub use storage::DurableStore;
