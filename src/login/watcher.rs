use std::sync::Arc;

use futures::StreamExt;
use tokio::{runtime::Handle, task::AbortHandle};
use tracing::debug;

use super::SessionCore;
use crate::host::PushChannel;

/// Waits for the pushed outcome of a login attempt.
pub struct SessionWatcher {
    channel: Arc<dyn PushChannel>,
    core: Arc<SessionCore>,
    runtime: Handle,
}

/// Subscription opened by [SessionWatcher::start].
///
/// Clones refer to the same subscription.
#[derive(Debug, Clone, Default)]
pub struct WatchHandle {
    pub(super) task: Option<AbortHandle>,
}

impl WatchHandle {
    /// A handle that watches nothing.
    pub fn inert() -> Self {
        Self::default()
    }

    /// Whether the subscription is still waiting for an event.
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub(crate) fn cancel(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

impl SessionWatcher {
    pub(crate) fn new(
        channel: Arc<dyn PushChannel>,
        core: Arc<SessionCore>,
        runtime: Handle,
    ) -> Self {
        Self {
            channel,
            core,
            runtime,
        }
    }

    /// Subscribe to the outcome for `correlation_token`.
    ///
    /// The first event decides: a destination is navigated to, an error fails the session.
    /// Whatever the channel emits afterwards is ignored.
    pub fn start(&self, correlation_token: &str) -> WatchHandle {
        if correlation_token.is_empty() {
            return WatchHandle::inert();
        }

        debug!(session = %self.core.id, "connecting to push channel");
        let mut events = self.channel.connect(correlation_token);
        let core = Arc::clone(&self.core);
        let task = self.runtime.spawn(async move {
            match events.next().await {
                Some(Ok(destination)) => core.complete(&destination),
                Some(Err(cause)) => core.fail(&cause),
                None => debug!(session = %core.id, "push channel closed without an outcome"),
            }
        });

        WatchHandle {
            task: Some(task.abort_handle()),
        }
    }

    /// Stop watching. Safe to call any number of times, before or after an outcome arrived.
    pub fn cancel(&self, handle: &WatchHandle) {
        handle.cancel();
    }
}
