//! Integration tests for identity bootstrap and workspace resolution.
//!
//! Covers user id caching, display name persistence across restarts
//! (file-backed storage), legacy session-name migration, workspace ids in
//! the location, and invite link copying.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use famtasks::identity::{IdentityStore, NameError, SESSION_ID_KEY, USER_NAME_KEY};
use famtasks::storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
use famtasks::workspace::{
    Clipboard, ClipboardError, Location, MemoryLocation, Osc52Clipboard, WorkspaceResolver,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A store that fails every call.
struct BrokenStore;

impl KeyValueStore for BrokenStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("disabled".into()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("disabled".into()))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("disabled".into()))
    }
}

/// A clipboard without permission to write.
struct DeniedClipboard;

impl Clipboard for DeniedClipboard {
    fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unavailable)
    }
}

fn memory_identity() -> (IdentityStore, Arc<MemoryStore>, Arc<MemoryStore>) {
    let persistent = Arc::new(MemoryStore::new());
    let session = Arc::new(MemoryStore::new());
    (
        IdentityStore::new(persistent.clone(), session.clone()),
        persistent,
        session,
    )
}

fn resolver(href: &str) -> (WorkspaceResolver, Arc<MemoryLocation>) {
    let location = Arc::new(MemoryLocation::parse(href).unwrap());
    (WorkspaceResolver::new(location.clone(), "family"), location)
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[test]
fn user_id_is_stable_within_a_session() {
    let (store, _, session) = memory_identity();
    let first = store.generate_user_id();
    assert_eq!(store.generate_user_id(), first);
    assert_eq!(session.get(SESSION_ID_KEY).unwrap(), Some(first));
}

#[test]
fn new_session_gets_new_user_id() {
    let persistent = Arc::new(MemoryStore::new());
    let a = IdentityStore::new(persistent.clone(), Arc::new(MemoryStore::new()));
    let b = IdentityStore::new(persistent, Arc::new(MemoryStore::new()));
    assert_ne!(a.generate_user_id(), b.generate_user_id());
    assert_eq!(a.get_user_name(), b.get_user_name());
}

#[test]
fn name_survives_restart_with_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("famtasks").join("storage.json");

    let first = IdentityStore::new(
        Arc::new(FileStore::new(&path)),
        Arc::new(MemoryStore::new()),
    );
    first.set_user_name("  Grandma Jo  ").unwrap();

    let second = IdentityStore::new(
        Arc::new(FileStore::new(&path)),
        Arc::new(MemoryStore::new()),
    );
    assert_eq!(second.get_user_name(), "Grandma Jo");
}

#[test]
fn legacy_session_name_is_migrated() {
    let (store, persistent, session) = memory_identity();
    session.set(USER_NAME_KEY, "Old Timer").unwrap();

    assert_eq!(store.get_user_name(), "Old Timer");
    assert_eq!(
        persistent.get(USER_NAME_KEY).unwrap().as_deref(),
        Some("Old Timer")
    );
}

#[test]
fn generated_name_is_persisted_once() {
    let (store, persistent, _) = memory_identity();
    let name = store.get_user_name();
    let (adjective, noun) = name.split_once(' ').unwrap();
    assert!(!adjective.is_empty() && !noun.is_empty());
    assert_eq!(store.get_user_name(), name);
    assert_eq!(persistent.get(USER_NAME_KEY).unwrap(), Some(name));
}

#[test]
fn validation_failures_leave_storage_untouched() {
    let (store, persistent, _) = memory_identity();
    store.set_user_name("Kind Alex").unwrap();

    let long = "x".repeat(31);
    for (candidate, code) in [
        ("   ", "empty"),
        (long.as_str(), "too-long"),
        ("a{b}", "invalid-characters"),
    ] {
        let err = store.set_user_name(candidate).unwrap_err();
        assert_eq!(err.code(), code);
    }
    assert_eq!(
        persistent.get(USER_NAME_KEY).unwrap().as_deref(),
        Some("Kind Alex")
    );
}

#[test]
fn thirty_characters_is_accepted() {
    let (store, _, _) = memory_identity();
    let name = "a".repeat(30);
    assert_eq!(store.set_user_name(&name).unwrap(), name);
}

#[test]
fn broken_storage_degrades_without_failing() {
    let store = IdentityStore::new(Arc::new(BrokenStore), Arc::new(BrokenStore));
    let id = store.generate_user_id();
    assert!(id.starts_with("user-"));
    assert!(!store.get_user_name().is_empty());

    let err = store.set_user_name("Kind Alex").unwrap_err();
    assert!(matches!(err, NameError::Storage(_)));
    assert_eq!(err.code(), "storage");
}

#[test]
fn unwritable_persistent_storage_keeps_generated_name() {
    let session = Arc::new(MemoryStore::new());
    let store = IdentityStore::new(Arc::new(BrokenStore), session.clone());
    let name = store.get_user_name();
    assert_eq!(store.get_user_name(), name);
    assert_eq!(session.get(USER_NAME_KEY).unwrap(), Some(name));
}

#[test]
fn corrupt_storage_file_reads_as_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, "{ not json").unwrap();

    let file = FileStore::new(&path);
    assert!(matches!(file.get(USER_NAME_KEY), Err(StorageError::Corrupt(_))));

    let store = IdentityStore::new(Arc::new(file), Arc::new(MemoryStore::new()));
    let name = store.get_user_name();
    assert!(!name.is_empty());
    assert_eq!(store.get_user_name(), name);

    // The generated name replaced the unreadable document.
    let reopened = FileStore::new(&path);
    assert_eq!(reopened.get(USER_NAME_KEY).unwrap(), Some(name));
    assert_eq!(store.set_user_name("Grandpa Lou").unwrap(), "Grandpa Lou");
}

// ---------------------------------------------------------------------------
// Workspace
// ---------------------------------------------------------------------------

#[test]
fn workspace_id_round_trips_through_location() {
    let (resolver, location) = resolver("http://localhost:5173/");
    assert!(resolver.get_workspace_id().is_none());

    let id = resolver.get_or_create_workspace_id();
    assert_eq!(resolver.get_or_create_workspace_id(), id);

    let reloaded =
        WorkspaceResolver::new(Arc::new(MemoryLocation::new(location.href())), "family");
    assert_eq!(reloaded.get_workspace_id(), Some(id));
}

#[test]
fn invite_link_opens_same_workspace() {
    let (alice, _) = resolver("http://localhost:5173/");
    let id = alice.get_or_create_workspace_id();
    let link = alice.get_invite_link();

    let (bob, _) = resolver(&link);
    assert_eq!(bob.get_or_create_workspace_id(), id);
}

#[test]
fn copy_invite_link_reports_outcome() {
    let (resolver, _) = resolver("http://localhost:5173/?family=bold-tribe-12");

    let clipboard = Osc52Clipboard::new(Vec::new());
    assert!(resolver.copy_invite_link(&clipboard));
    let written = String::from_utf8(clipboard.into_inner()).unwrap();
    assert!(written.starts_with("\x1b]52;c;"));
    assert!(written.ends_with('\x07'));

    assert!(!resolver.copy_invite_link(&DeniedClipboard));
}
