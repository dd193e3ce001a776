//! # Event Bus System
//!
//! Broadcasts what the player core did so UI and host glue can react without
//! polling: queue mutations, persistence results and session lifecycle.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐   emit   ┌───────────┐  subscribe  ┌────────────┐
//! │ QueueManager  ├─────────>│           ├────────────>│ UI binding │
//! └───────────────┘          │ EventBus  │             └────────────┘
//! ┌───────────────┐   emit   │(broadcast │  subscribe  ┌────────────┐
//! │SyncCoordinator├─────────>│ channel)  ├────────────>│ Host glue  │
//! └───────────────┘          └───────────┘             └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, QueueEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Queue(QueueEvent::Cleared { removed: 3 }));
//! assert_eq!(
//!     rx.recv().await.unwrap(),
//!     CoreEvent::Queue(QueueEvent::Cleared { removed: 3 })
//! );
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Receivers see the usual `broadcast` errors:
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events; it can keep
//!   receiving.
//! - **`RecvError::Closed`**: every sender was dropped (session torn down).
//!
//! Emitting with no subscribers is not an error: the core never depends on
//! anyone listening.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::RecvError;
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Now-playing queue mutations
    Queue(QueueEvent),
    /// Persistence of the queue and playback position
    Sync(SyncEvent),
    /// Player session lifecycle
    Lifecycle(LifecycleEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Queue(e) => e.description(),
            CoreEvent::Sync(e) => e.description(),
            CoreEvent::Lifecycle(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Sync(SyncEvent::PersistFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Sync(SyncEvent::RestoreCompleted { .. })
            | CoreEvent::Lifecycle(LifecycleEvent::SessionStarted { .. })
            | CoreEvent::Lifecycle(LifecycleEvent::SessionTornDown { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Events emitted by the queue manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum QueueEvent {
    /// A track was inserted into both the queue and the engine.
    TrackInserted {
        track_id: String,
        index: usize,
        queue_len: usize,
    },
    /// A track without a playable source was ignored.
    TrackSkipped { track_id: String },
    /// Queue and engine were emptied.
    Cleared { removed: usize },
}

impl QueueEvent {
    fn description(&self) -> &str {
        match self {
            QueueEvent::TrackInserted { .. } => "Track inserted",
            QueueEvent::TrackSkipped { .. } => "Non-playable track skipped",
            QueueEvent::Cleared { .. } => "Queue cleared",
        }
    }
}

/// Events emitted by the sync coordinator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SyncEvent {
    /// Rehydration from the durable store began.
    RestoreStarted { playlist_key: String },
    /// Rehydration finished (possibly with nothing to restore).
    RestoreCompleted {
        playlist_key: String,
        restored: usize,
        skipped: usize,
        position_restored: bool,
    },
    /// Both records were written.
    PersistCompleted { playlist_key: String, tracks: usize },
    /// At least one record could not be written.
    PersistFailed {
        playlist_key: String,
        message: String,
    },
}

impl SyncEvent {
    fn description(&self) -> &str {
        match self {
            SyncEvent::RestoreStarted { .. } => "Restore started",
            SyncEvent::RestoreCompleted { .. } => "Restore completed",
            SyncEvent::PersistCompleted { .. } => "Persist completed",
            SyncEvent::PersistFailed { .. } => "Persist failed",
        }
    }
}

/// Events describing the player session lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LifecycleEvent {
    SessionStarted { session_id: String },
    /// Host reported a lifecycle transition (`Foreground`, `Background`, `Terminating`).
    StateChanged { state: String },
    SessionTornDown { session_id: String },
}

impl LifecycleEvent {
    fn description(&self) -> &str {
        match self {
            LifecycleEvent::SessionStarted { .. } => "Session started",
            LifecycleEvent::StateChanged { .. } => "Lifecycle state changed",
            LifecycleEvent::SessionTornDown { .. } => "Session torn down",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning the bus yields another handle to the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all current subscribers.
    ///
    /// Returns how many subscribers received it (zero when nobody listens).
    pub fn emit(&self, event: CoreEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` that only yields events matching a predicate.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::new(16);
/// let sync_only = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Sync(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events for which `predicate` returns `true` are yielded.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next matching event.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Receives the next matching event without waiting.
    ///
    /// Returns `None` if nothing matching is buffered.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.accepts(&event) => return Some(Ok(event)),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}
