//! Core service façade.
//!
//! This crate wires host-provided bridge implementations (playback engine,
//! durable store, lifecycle observer) into a [`PlayerSession`]. Desktop apps
//! typically enable the `desktop-shims` feature, which lets `CoreConfig` fall
//! back to a file-backed store under the application data directory.
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use core_service::PlayerSession;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .playback_engine(Arc::new(ExoPlayerEngine::new(handle)))
//!     .durable_store(Arc::new(NoBackupStore::new(dir)))
//!     .build()?;
//!
//! let session = Arc::new(PlayerSession::new(config)?);
//! session.start()?;
//!
//! // From Activity.onPause / onDestroy
//! session.handle_lifecycle(LifecycleState::Background).await?;
//! ```

pub mod error;
pub mod session;

pub use error::{CoreError, Result};
pub use session::{PlayerSession, SessionId};
