//! In-process sync collaborator.
//!
//! Every binding created from the same [`LoopbackHub`] (or a clone of it)
//! shares channels and rooms, so several sessions in one process see each
//! other's writes immediately. Channels are seeded by whoever binds first;
//! later initial values are ignored.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use famtasks_proto::presence::{PresencePeer, UserPresence};
use parking_lot::Mutex;
use tokio::sync::watch;

use super::{PresenceRoom, StateChannel, SyncBackend, SyncError, SyncStatus, check_scope};
use crate::clock::now_ms;

/// Hub holding every channel and room of the process.
///
/// Channels and rooms live as long as the hub: a room whose peers have all
/// left keeps their disconnected entries, and nothing is ever evicted.
#[derive(Clone, Default)]
pub struct LoopbackHub {
    inner: Arc<HubInner>,
}

#[derive(Default)]
struct HubInner {
    channels: Mutex<HashMap<String, Arc<HubChannel>>>,
    rooms: Mutex<HashMap<String, Arc<HubRoom>>>,
    closed: Arc<AtomicBool>,
    defer_start: bool,
}

impl LoopbackHub {
    /// A hub whose presence publishers start as soon as they join.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A hub whose presence publishers only start on [`LoopbackPresence::start`].
    #[must_use]
    pub fn deferred() -> Self {
        Self {
            inner: Arc::new(HubInner {
                defer_start: true,
                ..HubInner::default()
            }),
        }
    }

    /// Shuts the hub down: existing bindings report offline and new
    /// bindings fail with [`SyncError::Unavailable`].
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        tracing::info!("loopback hub closed");
    }

    /// Whether [`close`](Self::close) was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), SyncError> {
        if self.is_closed() {
            return Err(SyncError::Unavailable("loopback hub is closed".to_string()));
        }
        Ok(())
    }

    /// Every participant of `room`, including disconnected ones.
    #[must_use]
    pub fn room_peers(&self, room: &str) -> Vec<PresencePeer> {
        self.inner
            .rooms
            .lock()
            .get(room)
            .map(|r| r.peers.lock().clone())
            .unwrap_or_default()
    }

    /// Joins `room` as `peer_id`, returning the concrete handle.
    ///
    /// A peer id that already left the room reconnects in place, keeping
    /// its position in the arrival order.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Unavailable`] if the hub is closed, or
    /// [`SyncError::InvalidScope`] for a blank room name or peer id.
    pub fn join(
        &self,
        room: &str,
        peer_id: &str,
        initial: UserPresence,
    ) -> Result<Arc<LoopbackPresence>, SyncError> {
        self.ensure_open()?;
        check_scope(room)?;
        check_scope(peer_id)?;

        let hub_room = self
            .inner
            .rooms
            .lock()
            .entry(room.to_string())
            .or_insert_with(|| Arc::new(HubRoom::new()))
            .clone();

        let now = now_ms();
        let generation = hub_room.claim(peer_id);
        hub_room.modify(|peers| {
            if let Some(existing) = peers.iter_mut().find(|p| p.peer_id == peer_id) {
                existing.state = None;
                existing.connected = true;
                existing.last_connected = Some(now);
                existing.error = None;
            } else {
                peers.push(PresencePeer::connected(peer_id, None, now));
            }
        });
        tracing::debug!(room, peer_id, "joined presence room");

        let presence = Arc::new(LoopbackPresence {
            room: hub_room,
            room_name: room.to_string(),
            peer_id: peer_id.to_string(),
            generation,
            initial,
            started: AtomicBool::new(false),
            left: AtomicBool::new(false),
            closed: Arc::clone(&self.inner.closed),
        });
        if !self.inner.defer_start {
            presence.start();
        }
        Ok(presence)
    }
}

impl SyncBackend for LoopbackHub {
    fn open_channel(
        &self,
        channel: &str,
        initial: Vec<u8>,
    ) -> Result<Arc<dyn StateChannel>, SyncError> {
        self.ensure_open()?;
        check_scope(channel)?;
        let hub_channel = self
            .inner
            .channels
            .lock()
            .entry(channel.to_string())
            .or_insert_with(|| {
                tracing::debug!(channel, "seeding shared channel");
                Arc::new(HubChannel {
                    name: channel.to_string(),
                    value: Mutex::new(initial),
                    revision: watch::Sender::new(0),
                    closed: Arc::clone(&self.inner.closed),
                })
            })
            .clone();
        Ok(hub_channel)
    }

    fn join_room(
        &self,
        room: &str,
        peer_id: &str,
        initial: UserPresence,
    ) -> Result<Arc<dyn PresenceRoom>, SyncError> {
        let presence: Arc<dyn PresenceRoom> = self.join(room, peer_id, initial)?;
        Ok(presence)
    }
}

struct HubChannel {
    name: String,
    value: Mutex<Vec<u8>>,
    revision: watch::Sender<u64>,
    closed: Arc<AtomicBool>,
}

impl StateChannel for HubChannel {
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
        if self.closed.load(Ordering::Acquire) {
            SyncStatus::OFFLINE
        } else {
            SyncStatus::LIVE
        }
    }
}

struct HubRoom {
    peers: Mutex<Vec<PresencePeer>>,
    /// Join generation per peer id; only the newest handle may leave.
    generations: Mutex<HashMap<String, u64>>,
    next_generation: AtomicU64,
    revision: watch::Sender<u64>,
}

impl HubRoom {
    fn new() -> Self {
        Self {
            peers: Mutex::new(Vec::new()),
            generations: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
            revision: watch::Sender::new(0),
        }
    }

    fn claim(&self, peer_id: &str) -> u64 {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        self.generations.lock().insert(peer_id.to_string(), generation);
        generation
    }

    fn is_current(&self, peer_id: &str, generation: u64) -> bool {
        self.generations.lock().get(peer_id) == Some(&generation)
    }

    fn modify(&self, f: impl FnOnce(&mut Vec<PresencePeer>)) {
        f(&mut self.peers.lock());
        self.revision.send_modify(|r| *r += 1);
    }
}

/// One participant's handle on a loopback room.
///
/// Dropping the handle leaves the room.
pub struct LoopbackPresence {
    room: Arc<HubRoom>,
    room_name: String,
    peer_id: String,
    generation: u64,
    initial: UserPresence,
    started: AtomicBool,
    left: AtomicBool,
    closed: Arc<AtomicBool>,
}

impl LoopbackPresence {
    /// Starts the publisher and publishes the initial state.
    ///
    /// Calling it again, or after leaving, does nothing.
    pub fn start(&self) {
        if self.left.load(Ordering::Acquire) || self.started.swap(true, Ordering::AcqRel) {
            return;
        }
        let initial = self.initial.clone();
        self.room.modify(|peers| {
            if let Some(me) = peers.iter_mut().find(|p| p.peer_id == self.peer_id) {
                me.state.get_or_insert(initial);
            }
        });
        tracing::debug!(room = %self.room_name, peer_id = %self.peer_id, "presence started");
    }

    /// Name of the room this handle belongs to.
    #[must_use]
    pub fn room_name(&self) -> &str {
        &self.room_name
    }
}

impl PresenceRoom for LoopbackPresence {
    fn peer_id(&self) -> &str {
        &self.peer_id
    }

    fn self_state(&self) -> Option<UserPresence> {
        self.room
            .peers
            .lock()
            .iter()
            .find(|p| p.peer_id == self.peer_id)
            .and_then(|p| p.state.clone())
    }

    fn set_state(&self, update: &mut dyn FnMut(Option<&UserPresence>) -> UserPresence) {
        if !self.started() {
            tracing::debug!(peer_id = %self.peer_id, "presence not started, dropping update");
            return;
        }
        self.room.modify(|peers| {
            if let Some(me) = peers.iter_mut().find(|p| p.peer_id == self.peer_id) {
                me.state = Some(update(me.state.as_ref()));
            }
        });
    }

    fn others(&self) -> Vec<PresencePeer> {
        self.room
            .peers
            .lock()
            .iter()
            .filter(|p| p.peer_id != self.peer_id)
            .cloned()
            .collect()
    }

    fn connected(&self) -> bool {
        !self.left.load(Ordering::Acquire) && !self.closed.load(Ordering::Acquire)
    }

    fn started(&self) -> bool {
        self.started.load(Ordering::Acquire) && !self.left.load(Ordering::Acquire)
    }

    fn leave(&self) {
        if self.left.swap(true, Ordering::AcqRel) {
            return;
        }
        if !self.room.is_current(&self.peer_id, self.generation) {
            tracing::debug!(peer_id = %self.peer_id, "stale presence handle released");
            return;
        }
        let now = now_ms();
        self.room.modify(|peers| {
            if let Some(me) = peers.iter_mut().find(|p| p.peer_id == self.peer_id) {
                me.connected = false;
                me.last_disconnected = Some(now);
            }
        });
        tracing::debug!(room = %self.room_name, peer_id = %self.peer_id, "left presence room");
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.room.revision.subscribe()
    }
}

impl Drop for LoopbackPresence {
    fn drop(&mut self) {
        self.leave();
    }
}
