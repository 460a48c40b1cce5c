//! Seam to the external real-time sync collaborator.
//!
//! Conflict resolution, transport and reconnection belong to the
//! collaborator. This crate only consumes two primitives:
//! - a shared-state channel ([`StateChannel`]) holding one opaque value that
//!   is read and replaced wholesale
//! - a presence room ([`PresenceRoom`]) where every participant publishes
//!   its own [`UserPresence`] and observes everybody else's
//!
//! Implementations:
//! - [`loopback::LoopbackHub`]: in-process collaborator shared by every
//!   binding created from the same hub
//! - [`local::LocalChannel`] / [`local::LocalPresence`]: never-connected
//!   stand-ins used after the collaborator failed to initialise
//!
//! Bindings expose "apply latest known value" semantics only: they never
//! retry, queue or reconnect on their own.

pub mod local;
pub mod loopback;

use std::marker::PhantomData;
use std::sync::Arc;

use famtasks_proto::codec::{self, CodecError};
use famtasks_proto::presence::{PresencePeer, UserPresence};
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;

pub use local::{LocalChannel, LocalPresence};
pub use loopback::{LoopbackHub, LoopbackPresence};

/// Readiness flags of a shared-state binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncStatus {
    /// The collaborator is reachable.
    pub connected: bool,
    /// The local value reflects the collaborator's value.
    pub synced: bool,
}

impl SyncStatus {
    /// Not connected, not synced.
    pub const OFFLINE: Self = Self {
        connected: false,
        synced: false,
    };

    /// Connected and synced.
    pub const LIVE: Self = Self {
        connected: true,
        synced: true,
    };

    /// Whether changes are currently flowing to other participants.
    #[must_use]
    pub const fn is_live(self) -> bool {
        self.connected && self.synced
    }

    /// One-line description for the connection indicator.
    #[must_use]
    pub const fn label(self) -> &'static str {
        if self.is_live() {
            "Live sync active \u{2022} Changes sync instantly"
        } else {
            "Connecting to sync service..."
        }
    }
}

/// Errors raised while binding to the collaborator.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The collaborator is not running or refused the binding.
    #[error("sync collaborator unavailable: {0}")]
    Unavailable(String),

    /// Empty or otherwise unusable channel/room name.
    #[error("invalid channel or room name: {0:?}")]
    InvalidScope(String),

    /// A value could not be encoded for the channel.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// One shared value, carried as opaque bytes.
pub trait StateChannel: Send + Sync {
    /// Channel name.
    fn name(&self) -> &str;

    /// Latest known value.
    fn snapshot(&self) -> Vec<u8>;

    /// Atomically replaces the value with `apply(current)`.
    ///
    /// `apply` is called exactly once. Returning `None` leaves the value
    /// (and the revision) unchanged.
    fn update(&self, apply: &mut dyn FnMut(&[u8]) -> Option<Vec<u8>>);

    /// Revision counter, bumped on every change.
    fn subscribe(&self) -> watch::Receiver<u64>;

    /// Readiness flags.
    fn status(&self) -> SyncStatus;
}

/// A presence room as seen by one participant.
pub trait PresenceRoom: Send + Sync {
    /// This participant's peer id.
    fn peer_id(&self) -> &str;

    /// This participant's state as echoed by the room.
    fn self_state(&self) -> Option<UserPresence>;

    /// Replaces this participant's state with `update(current)`.
    fn set_state(&self, update: &mut dyn FnMut(Option<&UserPresence>) -> UserPresence);

    /// Every other participant the room knows about, in arrival order.
    fn others(&self) -> Vec<PresencePeer>;

    /// The room is reachable.
    fn connected(&self) -> bool;

    /// The local publisher is ready to accept state updates.
    fn started(&self) -> bool;

    /// Leaves the room; the participant shows up as disconnected to others.
    fn leave(&self);

    /// Revision counter, bumped whenever any participant changes.
    fn subscribe(&self) -> watch::Receiver<u64>;
}

/// Factory for channels and rooms.
pub trait SyncBackend: Send + Sync {
    /// Binds to `channel`, seeding it with `initial` if it has no value yet.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the collaborator cannot provide the channel.
    fn open_channel(
        &self,
        channel: &str,
        initial: Vec<u8>,
    ) -> Result<Arc<dyn StateChannel>, SyncError>;

    /// Joins `room` as `peer_id`, publishing `initial` once started.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the collaborator cannot provide the room.
    fn join_room(
        &self,
        room: &str,
        peer_id: &str,
        initial: UserPresence,
    ) -> Result<Arc<dyn PresenceRoom>, SyncError>;
}

/// Rejects blank channel and room names.
pub(crate) fn check_scope(name: &str) -> Result<(), SyncError> {
    if name.trim().is_empty() {
        return Err(SyncError::InvalidScope(name.to_string()));
    }
    Ok(())
}

/// Typed view over a [`StateChannel`].
///
/// Values are postcard-encoded on the channel. If the channel ever holds
/// bytes that do not decode as `T`, the last value that did is used.
pub struct SharedState<T> {
    channel: Arc<dyn StateChannel>,
    last_good: Mutex<T>,
    _value: PhantomData<fn() -> T>,
}

impl<T> SharedState<T>
where
    T: Serialize + DeserializeOwned + Clone + PartialEq,
{
    /// Binds to `channel` on `backend`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if `initial` cannot be encoded or the backend
    /// refuses the channel.
    pub fn bind(backend: &dyn SyncBackend, channel: &str, initial: T) -> Result<Self, SyncError> {
        let bytes = codec::encode(&initial)?;
        let channel = backend.open_channel(channel, bytes)?;
        Ok(Self::from_channel(channel, initial))
    }

    /// Binds to a local-only channel that never syncs.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if `initial` cannot be encoded.
    pub fn local(channel: &str, initial: T) -> Result<Self, SyncError> {
        let bytes = codec::encode(&initial)?;
        let channel: Arc<dyn StateChannel> = Arc::new(LocalChannel::new(channel, bytes));
        Ok(Self::from_channel(channel, initial))
    }

    fn from_channel(channel: Arc<dyn StateChannel>, fallback: T) -> Self {
        let state = Self {
            channel,
            last_good: Mutex::new(fallback),
            _value: PhantomData,
        };
        state.refresh_last_good();
        state
    }

    /// Decodes the channel's current bytes into `last_good` if they are
    /// valid, so a later undecodable value falls back to them.
    fn refresh_last_good(&self) {
        let bytes = self.channel.snapshot();
        if let Ok(value) = codec::decode::<T>(&bytes) {
            *self.last_good.lock() = value;
        }
    }

    fn decode_or_last(&self, bytes: &[u8]) -> T {
        let mut last_good = self.last_good.lock();
        match codec::decode::<T>(bytes) {
            Ok(value) => {
                last_good.clone_from(&value);
                value
            }
            Err(e) => {
                tracing::warn!(
                    channel = self.channel.name(),
                    error = %e,
                    "undecodable shared value, keeping last known value"
                );
                last_good.clone()
            }
        }
    }

    /// The latest known value.
    #[must_use]
    pub fn current(&self) -> T {
        let bytes = self.channel.snapshot();
        self.decode_or_last(&bytes)
    }

    /// Replaces the value with `f(current)`.
    ///
    /// The transformation runs against the collaborator's current value, so
    /// concurrent writers are never overwritten with a stale copy. A result
    /// equal to the current value is not published.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Codec`] if the new value cannot be encoded; the
    /// shared value is left unchanged.
    pub fn replace(&self, f: impl FnOnce(&T) -> T) -> Result<(), SyncError> {
        let mut f = Some(f);
        let mut failure = None;
        self.channel.update(&mut |bytes: &[u8]| {
            let f = f.take()?;
            let current = self.decode_or_last(bytes);
            let next = f(&current);
            if next == current {
                return None;
            }
            match codec::encode(&next) {
                Ok(encoded) => {
                    *self.last_good.lock() = next;
                    Some(encoded)
                }
                Err(e) => {
                    failure = Some(e);
                    None
                }
            }
        });
        failure.map_or(Ok(()), |e| Err(SyncError::Codec(e)))
    }

    /// Readiness flags of the underlying channel.
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        self.channel.status()
    }

    /// Name of the underlying channel.
    #[must_use]
    pub fn channel_name(&self) -> &str {
        self.channel.name()
    }

    /// Revision receiver that fires whenever the value changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.channel.subscribe()
    }
}
