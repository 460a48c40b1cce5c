//! Background heartbeat task.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

use super::PresenceModel;

/// Owns the heartbeat task; dropping it cancels the task.
#[derive(Debug)]
pub struct HeartbeatGuard {
    handle: JoinHandle<()>,
}

impl HeartbeatGuard {
    /// Spawns the heartbeat loop for `model`.
    ///
    /// The first beat happens one `period` after spawning. Beats are skipped
    /// while the publisher has not started; once it has started and later
    /// stops, the loop exits on its own.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn spawn(model: Arc<PresenceModel>, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut tick = interval_at(Instant::now() + period, period);
            let mut seen_started = false;
            loop {
                tick.tick().await;
                if model.heartbeat() {
                    seen_started = true;
                } else if seen_started {
                    tracing::debug!(peer_id = model.peer_id(), "presence stopped, heartbeat exiting");
                    break;
                }
            }
        });
        Self { handle }
    }

    /// Whether the loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancels the loop.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for HeartbeatGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
