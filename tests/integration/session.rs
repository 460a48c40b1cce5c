//! End-to-end tests of client sessions sharing a workspace.
//!
//! Two or more [`Session`]s are opened on one loopback hub, joined through
//! an invite link, and driven through the prompt commands.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use famtasks::commands::{self, Command};
use famtasks::config::ClientConfig;
use famtasks::session::Session;
use famtasks::storage::MemoryStore;
use famtasks::sync::{LoopbackHub, SyncBackend};
use famtasks::workspace::{Clipboard, ClipboardError, MemoryLocation, Osc52Clipboard};
use famtasks_proto::task::TaskStatus;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct DeniedClipboard;

impl Clipboard for DeniedClipboard {
    fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unavailable)
    }
}

fn config(seed: bool) -> ClientConfig {
    ClientConfig {
        seed_demo_tasks: seed,
        data_file: None,
        ..ClientConfig::default()
    }
}

fn open(config: &ClientConfig, hub: Option<&LoopbackHub>, href: &str) -> Session {
    Session::open(
        config,
        hub.map(|h| h as &dyn SyncBackend),
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryLocation::parse(href).unwrap()),
    )
    .unwrap()
}

fn run(session: &Session, line: &str) -> Vec<String> {
    let command = Command::parse(line).unwrap();
    commands::execute(session, command, &DeniedClipboard).lines
}

// ---------------------------------------------------------------------------
// Opening
// ---------------------------------------------------------------------------

#[tokio::test]
async fn live_session_starts_seeded_and_synced() {
    let hub = LoopbackHub::new();
    let session = open(&config(true), Some(&hub), "http://localhost:5173/");

    assert!(!session.is_local_only());
    assert!(session.status().is_live());
    assert_eq!(session.tasks().tasks().len(), 4);
    assert!(session.invite_link().contains(session.workspace_id()));
    assert_eq!(
        session.presence_room(),
        format!("family-presence-{}", session.workspace_id())
    );
}

#[tokio::test]
async fn offline_session_runs_local_only() {
    let session = open(&config(true), None, "http://localhost:5173/");
    assert!(session.is_local_only());
    assert!(!session.status().is_live());
    assert_eq!(
        run(&session, "status"),
        vec!["Connecting to sync service...".to_string()]
    );

    // Tasks still work for the local participant.
    run(&session, "add chores Water plants");
    assert_eq!(session.tasks().tasks().len(), 5);
}

#[tokio::test]
async fn closed_hub_falls_back_to_local() {
    let hub = LoopbackHub::new();
    hub.close();
    let session = open(&config(false), Some(&hub), "http://localhost:5173/");

    assert!(session.is_local_only());
    assert_eq!(session.presence().roster().total_online, 1);
    run(&session, "add errands Post letter");
    assert_eq!(session.tasks().tasks().len(), 1);
}

// ---------------------------------------------------------------------------
// Sharing a workspace
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invite_link_joins_the_same_workspace() {
    let hub = LoopbackHub::new();
    let alice = open(&config(true), Some(&hub), "http://localhost:5173/");
    let bob = open(&config(true), Some(&hub), &alice.invite_link());

    assert_eq!(alice.workspace_id(), bob.workspace_id());
    // Bob's seed does not duplicate Alice's.
    assert_eq!(bob.tasks().tasks().len(), 4);

    run(&bob, "add groceries Buy bread");
    let titles: Vec<String> = alice.tasks().tasks().into_iter().map(|t| t.title).collect();
    assert!(titles.contains(&"Buy bread".to_string()));

    assert_eq!(alice.presence().roster().total_online, 2);
    assert_eq!(bob.presence().roster().total_online, 2);
}

#[tokio::test]
async fn separate_links_are_isolated() {
    let hub = LoopbackHub::new();
    let home = open(&config(false), Some(&hub), "http://localhost:5173/?family=home-1");
    let cabin = open(&config(false), Some(&hub), "http://localhost:5173/?family=cabin-2");

    run(&home, "add chores Sweep porch");
    assert!(cabin.tasks().tasks().is_empty());
    assert_eq!(cabin.presence().roster().total_online, 1);
}

#[tokio::test]
async fn closing_a_session_leaves_the_room() {
    let hub = LoopbackHub::new();
    let alice = open(&config(false), Some(&hub), "http://localhost:5173/?family=home-1");
    let bob = open(&config(false), Some(&hub), "http://localhost:5173/?family=home-1");
    assert_eq!(alice.presence().roster().total_online, 2);

    drop(bob);
    assert_eq!(alice.presence().roster().total_online, 1);
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_cycle_rename_delete_round() {
    let hub = LoopbackHub::new();
    let session = open(&config(false), Some(&hub), "http://localhost:5173/?family=home-1");

    let added = run(&session, "add groceries Buy milk");
    let short = added[0]
        .trim_start_matches("added [")
        .trim_end_matches(']')
        .to_string();

    assert_eq!(
        run(&session, &format!("cycle {short}")),
        vec!["Buy milk is now In Progress".to_string()]
    );
    assert_eq!(session.tasks().tasks()[0].status, TaskStatus::InProgress);

    run(&session, &format!("rename-task {short} Buy oat milk"));
    assert_eq!(session.tasks().tasks()[0].title, "Buy oat milk");

    assert_eq!(
        run(&session, &format!("delete {short}")),
        vec!["deleted Buy oat milk".to_string()]
    );
    assert!(session.tasks().tasks().is_empty());
    assert_eq!(
        run(&session, &format!("cycle {short}")),
        vec![format!("no single task matches [{short}]")]
    );
}

#[tokio::test]
async fn blank_title_is_refused() {
    let session = open(&config(false), None, "http://localhost:5173/?family=home-1");
    let reply = run(&session, "rename-task 1 x");
    assert_eq!(reply, vec!["no single task matches [1]".to_string()]);

    run(&session, "add chores Dust shelves");
    let id = session.tasks().tasks()[0].id.to_string();
    let command = Command::RenameTask {
        id,
        title: "   ".to_string(),
    };
    let reply = commands::execute(&session, command, &DeniedClipboard);
    assert_eq!(reply.lines.len(), 1);
    assert_eq!(session.tasks().tasks()[0].title, "Dust shelves");
}

#[tokio::test]
async fn name_command_updates_roster() {
    let hub = LoopbackHub::new();
    let alice = open(&config(false), Some(&hub), "http://localhost:5173/?family=home-1");
    let bob = open(&config(false), Some(&hub), "http://localhost:5173/?family=home-1");

    assert_eq!(run(&alice, "name Mom"), vec!["you are now Mom".to_string()]);
    assert_eq!(alice.identity().user_name, "Mom");
    let seen: Vec<String> = bob
        .presence()
        .roster()
        .visible
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(seen, vec!["Mom".to_string()]);

    let who = run(&bob, "who");
    assert!(who.iter().any(|line| line.contains("Mom")));

    let refused = run(&alice, "name a<b");
    assert_eq!(refused.len(), 1);
    assert_eq!(alice.identity().user_name, "Mom");
}

#[tokio::test]
async fn copy_writes_invite_to_clipboard() {
    let session = open(&config(false), None, "http://localhost:5173/?family=home-1");
    let clipboard = Osc52Clipboard::new(Vec::new());

    let reply = commands::execute(&session, Command::Copy, &clipboard);
    assert_eq!(reply.lines, vec!["invite link copied".to_string()]);
    assert!(!clipboard.into_inner().is_empty());

    let silent = commands::execute(&session, Command::Copy, &DeniedClipboard);
    assert!(silent.lines.is_empty());
    assert!(!silent.quit);
}

#[tokio::test]
async fn quit_ends_the_prompt() {
    let session = open(&config(false), None, "http://localhost:5173/?family=home-1");
    let reply = commands::execute(&session, Command::parse("exit").unwrap(), &DeniedClipboard);
    assert!(reply.quit);
}
