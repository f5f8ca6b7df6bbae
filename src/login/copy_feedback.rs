use std::{sync::Arc, time::Duration};

use tokio::{runtime::Handle, sync::watch, task::AbortHandle};

/// Transient "copied" flag that switches itself off after a fixed delay.
///
/// The flag only turns on through [CopyFeedbackTimer::trigger] and only turns off when its
/// own delay elapses.
#[derive(Debug)]
pub struct CopyFeedbackTimer {
    active: Arc<watch::Sender<bool>>,
    delay: Duration,
    pending_reset: Option<AbortHandle>,
    runtime: Handle,
}

impl CopyFeedbackTimer {
    pub fn new(runtime: Handle, delay: Duration) -> Self {
        let (active, _) = watch::channel(false);
        Self {
            active: Arc::new(active),
            delay,
            pending_reset: None,
            runtime,
        }
    }

    /// Switch the flag on and (re)start the delay that switches it off again.
    pub fn trigger(&mut self) {
        self.cancel();
        self.active.send_replace(true);

        // The deadline is fixed now, not when the reset task is first polled.
        let _enter = self.runtime.enter();
        let elapsed = tokio::time::sleep(self.delay);
        let active = Arc::clone(&self.active);
        let reset = self.runtime.spawn(async move {
            elapsed.await;
            active.send_replace(false);
        });
        self.pending_reset = Some(reset.abort_handle());
    }

    /// Drop a pending reset without touching the flag.
    pub fn cancel(&mut self) {
        if let Some(reset) = self.pending_reset.take() {
            reset.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        *self.active.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.active.subscribe()
    }
}
