//! Application Lifecycle
//!
//! Lets the host report foreground/background/terminate transitions so the
//! core can persist the now-playing queue at the right moments.

use crate::error::Result;

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Application is in the foreground and active
    Foreground,
    /// Application moved to the background (Activity `onPause`, scene inactive)
    Background,
    /// Application is being destroyed; the session should be torn down
    Terminating,
}

impl LifecycleState {
    /// Whether this transition should trigger a snapshot of the queue.
    pub fn requires_persist(&self) -> bool {
        matches!(self, LifecycleState::Background | LifecycleState::Terminating)
    }
}

/// Lifecycle observer trait
///
/// Notifies the core about app lifecycle transitions so it can:
/// - Save the queue and playback position when backgrounded
/// - Save and tear down the session before the process goes away
///
/// # Platform Support
///
/// - **iOS**: UIApplication lifecycle notifications
/// - **Android**: Activity/Application lifecycle callbacks
/// - **Desktop**: Window focus/close events (less critical)
///
/// # Example
///
/// ```ignore
/// use bridge_traits::background::{LifecycleObserver, LifecycleState};
///
/// async fn watch(observer: &dyn LifecycleObserver) -> Result<()> {
///     let mut stream = observer.subscribe_changes().await?;
///
///     while let Some(state) = stream.next().await {
///         if state.requires_persist() {
///             save_queue().await;
///         }
///     }
///     Ok(())
/// }
/// ```
#[async_trait::async_trait]
pub trait LifecycleObserver: Send + Sync {
    /// Get current lifecycle state
    async fn get_state(&self) -> Result<LifecycleState>;

    /// Subscribe to lifecycle state changes
    async fn subscribe_changes(&self) -> Result<Box<dyn LifecycleChangeStream>>;
}

/// Stream of lifecycle state changes
#[async_trait::async_trait]
pub trait LifecycleChangeStream: Send {
    /// Get the next lifecycle state update
    ///
    /// Returns `None` when the stream is closed.
    async fn next(&mut self) -> Option<LifecycleState>;
}
