//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux) and for tests.
//!
//! ## Overview
//!
//! This crate provides implementations of the bridge traits using
//! desktop-appropriate libraries:
//! - `DurableStore` as one file per key under the platform data directory
//! - `PlaybackEngine` as an in-memory simulation of a native engine
//! - `LifecycleObserver` driven by explicit notifications from the host shell
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ChannelLifecycleObserver, FileDurableStore, SimulatedPlaybackEngine};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = FileDurableStore::in_default_location("playlists");
//!     let engine = SimulatedPlaybackEngine::new();
//!     let lifecycle = ChannelLifecycleObserver::new();
//!
//!     // Use in core configuration
//! }
//! ```

mod background;
mod filesystem;
mod playback;

pub use background::ChannelLifecycleObserver;
pub use filesystem::FileDurableStore;
pub use playback::SimulatedPlaybackEngine;
