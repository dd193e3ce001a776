//! Player session lifecycle.
//!
//! A [`PlayerSession`] is the one explicitly constructed owner of the queue,
//! the sync coordinator and the event bus for a running app process:
//!
//! ```text
//! new --> start (restore) --> active (persist on Background) --> teardown
//! ```
//!
//! Hosts either forward lifecycle transitions through
//! [`PlayerSession::handle_lifecycle`] or let [`PlayerSession::watch_lifecycle`]
//! consume the configured `LifecycleObserver`.

use crate::error::{CoreError, Result};
use bridge_traits::LifecycleState;
use core_playback::{
    DirectResolver, PersistReport, QueueManager, RestoreReport, SyncConfig, SyncCoordinator,
    TrackResolver,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, LifecycleEvent};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Identifier of one session, attached to its tracing spans and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub struct PlayerSession {
    id: SessionId,
    config: CoreConfig,
    events: EventBus,
    queue: Arc<QueueManager>,
    coordinator: Arc<SyncCoordinator>,
    shutdown: CancellationToken,
}

impl PlayerSession {
    /// Build a session whose stored tracks are restored as-is.
    pub fn new(config: CoreConfig) -> Result<Self> {
        Self::with_resolver(config, Arc::new(DirectResolver))
    }

    /// Build a session with a custom track resolver for restore.
    pub fn with_resolver(config: CoreConfig, resolver: Arc<dyn TrackResolver>) -> Result<Self> {
        config.validate()?;

        let events = EventBus::new(config.event_buffer_size);
        let queue = Arc::new(QueueManager::new(
            config.playback_engine.clone(),
            events.clone(),
        ));
        let coordinator = Arc::new(SyncCoordinator::new(
            SyncConfig::new(config.playlist_key.clone()),
            config.durable_store.clone(),
            config.playback_engine.clone(),
            queue.clone(),
            resolver,
            events.clone(),
        ));

        Ok(Self {
            id: SessionId::new(),
            config,
            events,
            queue,
            coordinator,
            shutdown: CancellationToken::new(),
        })
    }

    /// Begin the session by restoring the stored queue on a background task.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn start(&self) -> Result<JoinHandle<RestoreReport>> {
        self.ensure_active()?;

        info!("Starting player session");
        self.events
            .emit(CoreEvent::Lifecycle(LifecycleEvent::SessionStarted {
                session_id: self.id.to_string(),
            }));

        Ok(self.coordinator.spawn_restore())
    }

    /// React to one app lifecycle transition.
    ///
    /// - `Foreground`: nothing to do
    /// - `Background`: persist (unless disabled in the config)
    /// - `Terminating`: persist, then tear the session down
    ///
    /// Returns the persist report when a persist ran.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub async fn handle_lifecycle(&self, state: LifecycleState) -> Result<Option<PersistReport>> {
        if self.is_torn_down() {
            debug!(?state, "Ignoring lifecycle transition after teardown");
            return Ok(None);
        }

        self.events
            .emit(CoreEvent::Lifecycle(LifecycleEvent::StateChanged {
                state: format!("{:?}", state),
            }));

        match state {
            LifecycleState::Foreground => Ok(None),
            LifecycleState::Background if !self.config.persist_on_background => {
                debug!("Persist on background disabled");
                Ok(None)
            }
            LifecycleState::Background => Ok(self.coordinator.persist().await),
            LifecycleState::Terminating => {
                let report = self.coordinator.persist().await;
                self.teardown().await?;
                Ok(report)
            }
        }
    }

    /// Consume the configured lifecycle observer until teardown.
    pub async fn watch_lifecycle(self: &Arc<Self>) -> Result<JoinHandle<()>> {
        self.ensure_active()?;

        let observer = self.config.lifecycle_observer.clone().ok_or_else(|| {
            CoreError::CapabilityMissing {
                capability: "LifecycleObserver".to_string(),
                message: "Inject a LifecycleObserver in CoreConfig or call handle_lifecycle \
                         from the host's lifecycle callbacks."
                    .to_string(),
            }
        })?;

        let mut changes = observer.subscribe_changes().await?;
        let token = self.shutdown.child_token();
        let session = Arc::clone(self);

        Ok(tokio::spawn(async move {
            loop {
                let state = tokio::select! {
                    _ = token.cancelled() => break,
                    next = changes.next() => match next {
                        Some(state) => state,
                        None => break,
                    },
                };

                if let Err(e) = session.handle_lifecycle(state).await {
                    warn!(session_id = %session.id, error = %e, "Lifecycle handling failed");
                }
            }
            debug!(session_id = %session.id, "Lifecycle watcher stopped");
        }))
    }

    /// Clear queue and engine, return the coordinator to `Unsynced` and stop
    /// the lifecycle watcher. Stored records are kept. Calling twice is a no-op.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub async fn teardown(&self) -> Result<()> {
        if self.is_torn_down() {
            return Ok(());
        }
        self.shutdown.cancel();

        self.coordinator.teardown().await?;

        info!("Player session torn down");
        self.events
            .emit(CoreEvent::Lifecycle(LifecycleEvent::SessionTornDown {
                session_id: self.id.to_string(),
            }));
        Ok(())
    }

    pub fn is_torn_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    fn ensure_active(&self) -> Result<()> {
        if self.is_torn_down() {
            return Err(CoreError::SessionTornDown(self.id.to_string()));
        }
        Ok(())
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn queue(&self) -> &Arc<QueueManager> {
        &self.queue
    }

    pub fn coordinator(&self) -> &Arc<SyncCoordinator> {
        &self.coordinator
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }
}

impl fmt::Debug for PlayerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerSession")
            .field("id", &self.id)
            .field("queue", &self.queue)
            .field("coordinator", &self.coordinator)
            .field("torn_down", &self.is_torn_down())
            .finish()
    }
}
