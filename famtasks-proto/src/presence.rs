//! Presence records published by each participant of a workspace.

use serde::{Deserialize, Serialize};

/// Longest accepted display name, in characters.
pub const MAX_NAME_LENGTH: usize = 30;

/// Characters a display name may not contain.
pub const FORBIDDEN_NAME_CHARS: [char; 7] = ['<', '>', '{', '}', '[', ']', '\\'];

/// Self-reported liveness of a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    /// Recently interacted with the app.
    Active,
    /// Present but not interacting.
    Idle,
}

impl std::fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Idle => write!(f, "idle"),
        }
    }
}

/// The presence state a participant publishes about itself.
///
/// Only the owning participant writes it; everybody else reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPresence {
    /// Display name.
    pub name: String,
    /// Liveness.
    pub status: PresenceStatus,
    /// Last interaction, milliseconds since epoch.
    pub last_activity: u64,
}

impl UserPresence {
    /// An active presence for `name` stamped at `now`.
    pub fn active(name: impl Into<String>, now: u64) -> Self {
        Self {
            name: name.into(),
            status: PresenceStatus::Active,
            last_activity: now,
        }
    }

    /// Returns a copy marked active at `now`, keeping the name.
    #[must_use]
    pub fn touched(&self, now: u64) -> Self {
        Self {
            name: self.name.clone(),
            status: PresenceStatus::Active,
            last_activity: now,
        }
    }

    /// Returns a copy carrying `name`, keeping status and last activity.
    #[must_use]
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

/// What the sync collaborator knows about one remote participant.
///
/// Entries appear when a peer connects and stay around with
/// `connected == false` after it leaves, until the collaborator evicts them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresencePeer {
    /// The peer's session identifier.
    pub peer_id: String,
    /// Last state the peer published, if any arrived yet.
    pub state: Option<UserPresence>,
    /// Whether the peer is currently connected.
    pub connected: bool,
    /// When the peer last connected, milliseconds since epoch.
    pub last_connected: Option<u64>,
    /// When the peer last disconnected, milliseconds since epoch.
    pub last_disconnected: Option<u64>,
    /// Opaque error reported by the collaborator for this peer.
    pub error: Option<String>,
}

impl PresencePeer {
    /// A freshly connected peer.
    pub fn connected(peer_id: impl Into<String>, state: Option<UserPresence>, now: u64) -> Self {
        Self {
            peer_id: peer_id.into(),
            state,
            connected: true,
            last_connected: Some(now),
            last_disconnected: None,
            error: None,
        }
    }

    /// Whether the peer belongs on the online roster.
    #[must_use]
    pub const fn is_online(&self) -> bool {
        self.connected && self.state.is_some()
    }
}
