//! Lifecycle Observer Implementation

use async_trait::async_trait;
use bridge_traits::{
    background::{LifecycleChangeStream, LifecycleObserver, LifecycleState},
    error::Result,
};
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

const CHANGE_BUFFER: usize = 16;

/// Lifecycle observer driven by explicit notifications.
///
/// Desktop windows never get backgrounded by the OS, so the host shell calls
/// [`notify`](Self::notify) when it minimizes or closes. Tests use the same
/// entry point to replay mobile transitions.
pub struct ChannelLifecycleObserver {
    current: watch::Sender<LifecycleState>,
    changes: broadcast::Sender<LifecycleState>,
}

impl ChannelLifecycleObserver {
    /// Create an observer that starts in the foreground.
    pub fn new() -> Self {
        let (current, _) = watch::channel(LifecycleState::Foreground);
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self { current, changes }
    }

    /// Report a lifecycle transition to every subscriber.
    pub fn notify(&self, state: LifecycleState) {
        self.current.send_replace(state);
        let receivers = self.changes.send(state).unwrap_or(0);
        debug!(?state, receivers, "Lifecycle transition");
    }
}

impl Default for ChannelLifecycleObserver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LifecycleObserver for ChannelLifecycleObserver {
    async fn get_state(&self) -> Result<LifecycleState> {
        Ok(*self.current.borrow())
    }

    async fn subscribe_changes(&self) -> Result<Box<dyn LifecycleChangeStream>> {
        Ok(Box::new(ChannelLifecycleChangeStream {
            receiver: self.changes.subscribe(),
        }))
    }
}

struct ChannelLifecycleChangeStream {
    receiver: broadcast::Receiver<LifecycleState>,
}

#[async_trait]
impl LifecycleChangeStream for ChannelLifecycleChangeStream {
    async fn next(&mut self) -> Option<LifecycleState> {
        loop {
            match self.receiver.recv().await {
                Ok(state) => return Some(state),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Lifecycle subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
