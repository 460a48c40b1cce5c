//! `famtasks` binary: shared family task list with live presence.
//!
//! Opens a session on the in-process sync hub and runs a line-oriented
//! prompt. Configuration via CLI flags, environment variables, or config
//! file (`~/.config/famtasks/config.toml`).
//!
//! ```bash
//! # Start a new workspace with three simulated family members
//! cargo run --bin famtasks -- --demo-peers 3
//!
//! # Join an existing workspace from an invite link
//! cargo run --bin famtasks -- --link 'http://localhost:5173/?family=kind-clan-7'
//!
//! # Local-only mode, nothing shared
//! cargo run --bin famtasks -- --offline
//! ```

use std::io;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use famtasks_proto::presence::UserPresence;
use rand::Rng;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_appender::non_blocking::WorkerGuard;

use famtasks::clock::now_ms;
use famtasks::commands::{self, Command, CommandError};
use famtasks::config::{CliArgs, ClientConfig};
use famtasks::identity;
use famtasks::presence::online_label;
use famtasks::session::Session;
use famtasks::storage::{FileStore, KeyValueStore, MemoryStore};
use famtasks::sync::{LoopbackHub, LoopbackPresence, SyncBackend};
use famtasks::workspace::{Location, Osc52Clipboard};

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    // CLI args > env > config file > defaults.
    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig {
                offline: cli.offline,
                demo_peers: cli.demo_peers,
                ..ClientConfig::default()
            }
        }
    };

    // Logs go to a file so stdout stays clean for the prompt.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!("famtasks starting");

    let persistent: Arc<dyn KeyValueStore> = match &config.data_file {
        Some(path) => Arc::new(FileStore::new(path)),
        None => {
            tracing::warn!("no data directory, display name will not persist");
            Arc::new(MemoryStore::new())
        }
    };
    let session_store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    let location: Arc<dyn Location> = match config.location() {
        Ok(location) => Arc::new(location),
        Err(e) => {
            eprintln!("Warning: {e}, starting a new workspace");
            Arc::new(ClientConfig::default().location().map_err(io::Error::other)?)
        }
    };

    let hub = LoopbackHub::new();
    let backend: Option<&dyn SyncBackend> = if config.offline {
        None
    } else {
        Some(&hub as &dyn SyncBackend)
    };

    let session = Session::open(&config, backend, persistent, session_store, location)
        .map_err(io::Error::other)?;

    let _demo_peers = if config.offline {
        Vec::new()
    } else {
        join_demo_peers(&hub, session.presence_room(), config.demo_peers)
    };

    let result = run_prompt(&session).await;

    drop(session);
    tracing::info!("famtasks exiting");
    result
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("famtasks.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Joins `count` simulated family members to `room`.
fn join_demo_peers(hub: &LoopbackHub, room: &str, count: usize) -> Vec<Arc<LoopbackPresence>> {
    let mut rng = rand::rng();
    (0..count)
        .filter_map(|_| {
            let peer_id = identity::new_session_id(&mut rng, now_ms());
            let name = identity::random_user_name(&mut rng);
            let idle_for = rng.random_range(0..600_000);
            let state = UserPresence::active(name, now_ms().saturating_sub(idle_for));
            match hub.join(room, &peer_id, state) {
                Ok(peer) => Some(peer),
                Err(e) => {
                    tracing::warn!(error = %e, "could not join demo peer");
                    None
                }
            }
        })
        .collect()
}

/// Reads commands from stdin until `quit` or end of input.
async fn run_prompt(session: &Session) -> io::Result<()> {
    let clipboard = Osc52Clipboard::new(io::stdout());
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let roster = session.presence().roster();
    let banner = [
        format!("famtasks workspace {}", session.workspace_id()),
        format!("invite link: {}", session.invite_link()),
        format!("you are {}", session.identity().user_name),
        session.status().label().to_string(),
        online_label(roster.total_online),
        "type `help` for commands".to_string(),
    ];
    for line in banner {
        stdout.write_all(format!("{line}\n").as_bytes()).await?;
    }

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(CommandError::Empty) => continue,
            Err(e) => {
                stdout.write_all(format!("{e}\n").as_bytes()).await?;
                continue;
            }
        };

        let reply = commands::execute(session, command, &clipboard);
        for line in &reply.lines {
            stdout.write_all(format!("{line}\n").as_bytes()).await?;
        }
        if reply.quit {
            break;
        }
    }
    Ok(())
}
