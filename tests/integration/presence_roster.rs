//! Integration tests for live presence.
//!
//! Tests roster building across several participants on the loopback hub,
//! renaming, activity throttling, and the heartbeat loop under paused time.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use famtasks::identity::IdentityStore;
use famtasks::presence::{ActivityKind, PresenceConfig, PresenceModel};
use famtasks::storage::MemoryStore;
use famtasks::sync::{LoopbackHub, LoopbackPresence, PresenceRoom};
use famtasks_proto::presence::{PresenceStatus, UserPresence};

const ROOM: &str = "family-presence-home";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn model_on(
    hub: &LoopbackHub,
    peer_id: &str,
    name: &str,
) -> (Arc<PresenceModel>, Arc<LoopbackPresence>) {
    let initial = UserPresence::active(name, 1_000);
    let handle = hub.join(ROOM, peer_id, initial.clone()).unwrap();
    let room: Arc<dyn PresenceRoom> = handle.clone();
    let model = Arc::new(PresenceModel::new(room, initial, PresenceConfig::default()));
    (model, handle)
}

fn last_activity(handle: &LoopbackPresence) -> Option<u64> {
    handle.self_state().map(|s| s.last_activity)
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

#[test]
fn six_others_show_four_and_overflow() {
    let hub = LoopbackHub::new();
    let (me, _me_handle) = model_on(&hub, "me", "Kind Sam");
    let others: Vec<_> = (0..6)
        .map(|i| model_on(&hub, &format!("p{i}"), &format!("Peer {i}")))
        .collect();

    let roster = me.roster();
    assert_eq!(roster.visible.len(), 4);
    assert_eq!(roster.overflow_label().as_deref(), Some("+2"));
    assert_eq!(roster.total_online, 7);
    assert_eq!(roster.online_label(), "7 people online");

    let names: Vec<&str> = roster.visible.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Peer 0", "Peer 1", "Peer 2", "Peer 3"]);
    assert!(roster.me.is_self);
    drop(others);
}

#[test]
fn departed_peer_drops_off_the_roster() {
    let hub = LoopbackHub::new();
    let (me, _me_handle) = model_on(&hub, "me", "Kind Sam");
    let (ann, _ann_handle) = model_on(&hub, "ann", "Ann");
    assert_eq!(me.roster().total_online, 2);

    ann.leave();
    let roster = me.roster();
    assert_eq!(roster.total_online, 1);
    assert_eq!(roster.online_label(), "1 person online");
}

#[test]
fn rename_is_visible_to_others() {
    let hub = LoopbackHub::new();
    let identity = IdentityStore::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()));
    let (me, _me_handle) = model_on(&hub, "me", "Kind Sam");
    let (ann, _ann_handle) = model_on(&hub, "ann", "Ann");

    assert_eq!(me.rename(&identity, "  Sam the Great ").unwrap(), "Sam the Great");
    let seen: Vec<String> = ann.roster().visible.into_iter().map(|e| e.name).collect();
    assert_eq!(seen, vec!["Sam the Great"]);
    assert_eq!(identity.get_user_name(), "Sam the Great");
}

#[test]
fn invalid_rename_publishes_nothing() {
    let hub = LoopbackHub::new();
    let identity = IdentityStore::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()));
    let (me, handle) = model_on(&hub, "me", "Kind Sam");
    let mut rx = handle.subscribe();
    let _ = rx.borrow_and_update();

    let err = me.rename(&identity, "<script>").unwrap_err();
    assert_eq!(err.code(), "invalid-characters");
    assert!(!rx.has_changed().unwrap());
    assert_eq!(me.current_user().name, "Kind Sam");
}

// ---------------------------------------------------------------------------
// Activity and heartbeat
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn activity_is_throttled_to_one_per_window() {
    let hub = LoopbackHub::new();
    let (me, handle) = model_on(&hub, "me", "Kind Sam");

    assert!(me.record_activity(ActivityKind::PointerMove));
    let first = last_activity(&handle).unwrap();
    assert!(first > 1_000);

    assert!(!me.record_activity(ActivityKind::KeyPress));
    tokio::time::advance(Duration::from_secs(2)).await;
    assert!(!me.record_activity(ActivityKind::PointerClick));

    tokio::time::advance(Duration::from_secs(4)).await;
    assert!(me.record_activity(ActivityKind::PointerClick));
    assert_eq!(me.current_user().status, PresenceStatus::Active);
}

#[tokio::test(start_paused = true)]
async fn nothing_is_published_before_start() {
    let hub = LoopbackHub::deferred();
    let (me, handle) = model_on(&hub, "me", "Kind Sam");
    let _heartbeat = me.spawn_heartbeat();

    assert!(!me.record_activity(ActivityKind::KeyPress));
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(last_activity(&handle), None);

    // Until started, the local participant only sees its own mirror.
    assert_eq!(me.current_user().name, "Kind Sam");
    assert_eq!(me.roster().total_online, 1);
}

#[tokio::test(start_paused = true)]
async fn heartbeat_refreshes_after_one_period() {
    let hub = LoopbackHub::deferred();
    let (me, handle) = model_on(&hub, "me", "Kind Sam");
    let _heartbeat = me.spawn_heartbeat();

    handle.start();
    assert_eq!(last_activity(&handle), Some(1_000));

    tokio::time::sleep(Duration::from_secs(29)).await;
    assert_eq!(last_activity(&handle), Some(1_000));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(last_activity(&handle).unwrap() > 1_000);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_guard_stops_heartbeats() {
    let hub = LoopbackHub::deferred();
    let (me, handle) = model_on(&hub, "me", "Kind Sam");
    handle.start();

    let heartbeat = me.spawn_heartbeat();
    heartbeat.stop();

    tokio::time::sleep(Duration::from_secs(95)).await;
    assert_eq!(last_activity(&handle), Some(1_000));
}

#[tokio::test(start_paused = true)]
async fn heartbeat_exits_after_leaving() {
    let hub = LoopbackHub::new();
    let (me, _handle) = model_on(&hub, "me", "Kind Sam");
    let heartbeat = me.spawn_heartbeat();

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert!(!heartbeat.is_finished());

    me.leave();
    tokio::time::sleep(Duration::from_secs(31)).await;
    tokio::task::yield_now().await;
    assert!(heartbeat.is_finished());
    assert!(!me.connected());
}
