use std::{sync::Arc, time::Duration};

use tokio::{runtime::Handle, task::AbortHandle};
use tracing::debug;

use super::{watcher::WatchHandle, SessionCore};

/// Gives up on a login attempt once its time window has passed.
pub struct TimeoutGuard {
    core: Arc<SessionCore>,
    duration: Duration,
    runtime: Handle,
}

/// Countdown scheduled by [TimeoutGuard::arm].
#[derive(Debug, Default)]
pub struct GuardHandle {
    task: Option<AbortHandle>,
}

impl GuardHandle {
    /// Whether the countdown is still running.
    pub fn is_armed(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl TimeoutGuard {
    pub(crate) fn new(core: Arc<SessionCore>, duration: Duration, runtime: Handle) -> Self {
        Self {
            core,
            duration,
            runtime,
        }
    }

    /// Start the countdown for `correlation_token`.
    ///
    /// On expiry the session times out, `watch` is cancelled and, when `home_uri` is set, the
    /// page is sent there. The countdown stops early once the session settles some other way.
    /// Nothing is scheduled for an empty token.
    pub fn arm(
        &self,
        correlation_token: &str,
        home_uri: &str,
        watch: WatchHandle,
    ) -> GuardHandle {
        if correlation_token.is_empty() {
            return GuardHandle::default();
        }

        debug!(session = %self.core.id, timeout = ?self.duration, "arming login timeout");
        let _enter = self.runtime.enter();
        let elapsed = tokio::time::sleep(self.duration);
        let core = Arc::clone(&self.core);
        let home_uri = home_uri.to_owned();
        let task = self.runtime.spawn(async move {
            tokio::select! {
                () = elapsed => core.time_out(&watch, &home_uri),
                () = core.settled() => debug!(session = %core.id, "login timeout disarmed"),
            }
        });

        GuardHandle {
            task: Some(task.abort_handle()),
        }
    }

    /// Stop the countdown. Safe to call any number of times.
    pub fn disarm(&self, handle: &GuardHandle) {
        if let Some(task) = &handle.task {
            task.abort();
        }
    }
}
