//! Display-ready roster of who is online.

use famtasks_proto::presence::{PresencePeer, PresenceStatus, UserPresence};

use crate::avatar::Avatar;

/// One participant on the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    /// Presence peer id.
    pub peer_id: String,
    /// Display name.
    pub name: String,
    /// Self-reported liveness.
    pub status: PresenceStatus,
    /// Last interaction, milliseconds since epoch.
    pub last_activity: u64,
    /// Avatar derived from the name.
    pub avatar: Avatar,
    /// Whether this is the local participant.
    pub is_self: bool,
}

impl RosterEntry {
    fn new(peer_id: &str, presence: &UserPresence, is_self: bool) -> Self {
        Self {
            peer_id: peer_id.to_string(),
            name: presence.name.clone(),
            status: presence.status,
            last_activity: presence.last_activity,
            avatar: Avatar::for_name(&presence.name),
            is_self,
        }
    }
}

/// The local participant followed by the remote ones worth showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    /// The local participant, always present.
    pub me: RosterEntry,
    /// Remote participants shown individually, in arrival order.
    pub visible: Vec<RosterEntry>,
    /// Online remote participants not shown individually.
    pub overflow: usize,
    /// Everybody online, the local participant included.
    pub total_online: usize,
}

impl Roster {
    /// "1 person online" or "N people online".
    #[must_use]
    pub fn online_label(&self) -> String {
        online_label(self.total_online)
    }

    /// The "+N" badge, when some participants are not shown.
    #[must_use]
    pub fn overflow_label(&self) -> Option<String> {
        (self.overflow > 0).then(|| format!("+{}", self.overflow))
    }
}

/// Formats an online head count.
#[must_use]
pub fn online_label(count: usize) -> String {
    if count == 1 {
        "1 person online".to_string()
    } else {
        format!("{count} people online")
    }
}

/// Builds the roster from the local state and the room's other peers.
///
/// Only connected peers that have published a state count as online.
/// Entries carrying the local peer id are skipped, since some
/// collaborators echo the local participant back among the others.
#[must_use]
pub fn build_roster(
    self_peer_id: &str,
    me: &UserPresence,
    others: &[PresencePeer],
    max_visible: usize,
) -> Roster {
    let online: Vec<RosterEntry> = others
        .iter()
        .filter(|peer| peer.peer_id != self_peer_id)
        .filter_map(|peer| match &peer.state {
            Some(state) if peer.connected => Some(RosterEntry::new(&peer.peer_id, state, false)),
            _ => None,
        })
        .collect();

    let total_online = online.len() + 1;
    let overflow = online.len().saturating_sub(max_visible);
    let visible = online.into_iter().take(max_visible).collect();

    Roster {
        me: RosterEntry::new(self_peer_id, me, true),
        visible,
        overflow,
        total_online,
    }
}
