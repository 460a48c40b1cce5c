//! Presence view-model: the local participant's published state plus the
//! roster of everybody else in the workspace.
//!
//! The model republishes the local state on a fixed heartbeat and whenever
//! the user interacts (throttled). It never flips the local participant to
//! [`PresenceStatus::Idle`](famtasks_proto::presence::PresenceStatus::Idle)
//! on its own.

pub mod heartbeat;
pub mod roster;

use std::sync::Arc;
use std::time::Duration;

use famtasks_proto::presence::UserPresence;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::Instant;

pub use heartbeat::HeartbeatGuard;
pub use roster::{Roster, RosterEntry, build_roster, online_label};

use crate::clock::now_ms;
use crate::identity::{IdentityStore, NameError};
use crate::sync::PresenceRoom;

/// User interactions that count as activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    /// Pointer moved.
    PointerMove,
    /// A key was pressed.
    KeyPress,
    /// Pointer clicked.
    PointerClick,
}

/// Timing and display knobs of the presence model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceConfig {
    /// Period of the heartbeat republish.
    pub heartbeat_interval: Duration,
    /// Minimum gap between two activity-driven republishes.
    pub activity_throttle: Duration,
    /// Remote participants shown individually on the roster.
    pub max_visible_peers: usize,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
            activity_throttle: Duration::from_secs(5),
            max_visible_peers: 4,
        }
    }
}

/// The local participant's view of a presence room.
pub struct PresenceModel {
    room: Arc<dyn PresenceRoom>,
    /// Last state this model published; stands in until the room echoes it.
    mirror: Mutex<UserPresence>,
    last_activity_publish: Mutex<Option<Instant>>,
    config: PresenceConfig,
}

impl PresenceModel {
    /// Wraps `room`, with `initial` as the local state until the room
    /// reports one.
    pub fn new(room: Arc<dyn PresenceRoom>, initial: UserPresence, config: PresenceConfig) -> Self {
        Self {
            room,
            mirror: Mutex::new(initial),
            last_activity_publish: Mutex::new(None),
            config,
        }
    }

    /// The local peer id.
    #[must_use]
    pub fn peer_id(&self) -> &str {
        self.room.peer_id()
    }

    /// Model configuration.
    #[must_use]
    pub const fn config(&self) -> &PresenceConfig {
        &self.config
    }

    /// The local state as the room echoes it, or the mirror before the
    /// echo arrives.
    ///
    /// The display name always comes from the mirror, which holds renames
    /// made before the publisher started.
    #[must_use]
    pub fn current_user(&self) -> UserPresence {
        let mirror = self.mirror.lock().clone();
        match self.room.self_state() {
            Some(echo) if echo.name == mirror.name => echo,
            Some(echo) => echo.renamed(mirror.name),
            None => mirror,
        }
    }

    /// Whether the room is reachable.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.room.connected()
    }

    /// Whether the local publisher has started.
    #[must_use]
    pub fn started(&self) -> bool {
        self.room.started()
    }

    /// Publishes `status = Active, last_activity = now` if the publisher has
    /// started. Returns whether anything was published.
    pub fn heartbeat(&self) -> bool {
        if !self.room.started() {
            return false;
        }
        self.publish_active();
        true
    }

    /// Records a user interaction, publishing at most once per throttle
    /// window. Returns whether this interaction was published.
    pub fn record_activity(&self, kind: ActivityKind) -> bool {
        if !self.room.started() {
            return false;
        }
        let now = Instant::now();
        {
            let mut last = self.last_activity_publish.lock();
            let throttled = last.is_some_and(|previous| {
                now.duration_since(previous) < self.config.activity_throttle
            });
            if throttled {
                return false;
            }
            *last = Some(now);
        }
        tracing::trace!(?kind, "activity published");
        self.publish_active();
        true
    }

    fn publish_active(&self) {
        let now = now_ms();
        let fallback = self.mirror.lock().clone();
        let mut published = None;
        self.room.set_state(&mut |current: Option<&UserPresence>| {
            let next = current.map_or_else(
                || fallback.touched(now),
                |p| p.renamed(fallback.name.clone()).touched(now),
            );
            published = Some(next.clone());
            next
        });
        if let Some(next) = published {
            *self.mirror.lock() = next;
        }
    }

    /// Validates and persists `candidate` through `identity`, then
    /// publishes the new name keeping the current status and last activity.
    ///
    /// # Errors
    ///
    /// Returns the [`NameError`] from validation or persistence; nothing is
    /// published in that case.
    pub fn rename(&self, identity: &IdentityStore, candidate: &str) -> Result<String, NameError> {
        let name = identity.set_user_name(candidate)?;
        let fallback = self.current_user();
        self.room.set_state(&mut |current: Option<&UserPresence>| {
            current.map_or_else(|| fallback.renamed(name.clone()), |p| p.renamed(name.clone()))
        });
        {
            let mut mirror = self.mirror.lock();
            *mirror = mirror.renamed(name.clone());
        }
        tracing::info!(peer_id = self.peer_id(), name = %name, "display name changed");
        Ok(name)
    }

    /// The roster as of now.
    #[must_use]
    pub fn roster(&self) -> Roster {
        build_roster(
            self.peer_id(),
            &self.current_user(),
            &self.room.others(),
            self.config.max_visible_peers,
        )
    }

    /// Fires whenever anybody in the room changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.room.subscribe()
    }

    /// Leaves the room.
    pub fn leave(&self) {
        self.room.leave();
    }

    /// Starts the heartbeat loop.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use = "dropping the guard stops the heartbeat"]
    pub fn spawn_heartbeat(self: &Arc<Self>) -> HeartbeatGuard {
        HeartbeatGuard::spawn(Arc::clone(self), self.config.heartbeat_interval)
    }
}
