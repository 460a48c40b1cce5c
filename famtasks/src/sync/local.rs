//! Local-only stand-ins for the sync collaborator.
//!
//! Used when the real collaborator failed to initialise: the app keeps
//! working for the local participant, everything else reads as offline.

use std::sync::atomic::{AtomicBool, Ordering};

use famtasks_proto::presence::{PresencePeer, UserPresence};
use parking_lot::Mutex;
use tokio::sync::watch;

use super::{PresenceRoom, StateChannel, SyncStatus};

/// A channel that only exists in this process and never syncs.
pub struct LocalChannel {
    name: String,
    value: Mutex<Vec<u8>>,
    revision: watch::Sender<u64>,
}

impl LocalChannel {
    /// Channel named `name` holding `initial`.
    pub fn new(name: impl Into<String>, initial: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            value: Mutex::new(initial),
            revision: watch::Sender::new(0),
        }
    }
}

impl StateChannel for LocalChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn snapshot(&self) -> Vec<u8> {
        self.value.lock().clone()
    }

    fn update(&self, apply: &mut dyn FnMut(&[u8]) -> Option<Vec<u8>>) {
        let changed = {
            let mut value = self.value.lock();
            match apply(&value) {
                Some(next) => {
                    *value = next;
                    true
                }
                None => false,
            }
        };
        if changed {
            self.revision.send_modify(|r| *r += 1);
        }
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn status(&self) -> SyncStatus {
        SyncStatus::OFFLINE
    }
}

/// A presence room with nobody else in it.
///
/// Publishing works (the local roster keeps showing the user), but the
/// room never reports a connection.
pub struct LocalPresence {
    peer_id: String,
    state: Mutex<UserPresence>,
    left: AtomicBool,
    revision: watch::Sender<u64>,
}

impl LocalPresence {
    /// Room for `peer_id` starting from `initial`.
    pub fn new(peer_id: impl Into<String>, initial: UserPresence) -> Self {
        Self {
            peer_id: peer_id.into(),
            state: Mutex::new(initial),
            left: AtomicBool::new(false),
            revision: watch::Sender::new(0),
        }
    }
}

impl PresenceRoom for LocalPresence {
    fn peer_id(&self) -> &str {
        &self.peer_id
    }

    fn self_state(&self) -> Option<UserPresence> {
        Some(self.state.lock().clone())
    }

    fn set_state(&self, update: &mut dyn FnMut(Option<&UserPresence>) -> UserPresence) {
        if self.left.load(Ordering::Acquire) {
            return;
        }
        {
            let mut state = self.state.lock();
            let next = update(Some(&*state));
            *state = next;
        }
        self.revision.send_modify(|r| *r += 1);
    }

    fn others(&self) -> Vec<PresencePeer> {
        Vec::new()
    }

    fn connected(&self) -> bool {
        false
    }

    fn started(&self) -> bool {
        !self.left.load(Ordering::Acquire)
    }

    fn leave(&self) {
        self.left.store(true, Ordering::Release);
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}
