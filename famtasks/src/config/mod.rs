//! Configuration for the `famtasks` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/famtasks/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::presence::PresenceConfig;
use crate::workspace::{DEFAULT_QUERY_PARAM, MemoryLocation};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// The workspace link is not an absolute URL.
    #[error("invalid workspace link {link:?}: {source}")]
    InvalidLink {
        /// The offending link.
        link: String,
        /// Underlying parse error.
        source: url::ParseError,
    },
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    workspace: WorkspaceFileConfig,
    presence: PresenceFileConfig,
    storage: StorageFileConfig,
    tasks: TasksFileConfig,
}

/// `[workspace]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct WorkspaceFileConfig {
    base_url: Option<String>,
    query_param: Option<String>,
    task_channel_prefix: Option<String>,
    presence_room_prefix: Option<String>,
}

/// `[presence]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct PresenceFileConfig {
    heartbeat_secs: Option<u64>,
    activity_throttle_secs: Option<u64>,
    max_visible_peers: Option<usize>,
}

/// `[storage]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct StorageFileConfig {
    data_file: Option<PathBuf>,
}

/// `[tasks]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct TasksFileConfig {
    seed_demo_tasks: Option<bool>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -- Workspace --
    /// Location the session starts at; an invite link joins its workspace.
    pub link: String,
    /// Query parameter carrying the workspace id.
    pub query_param: String,
    /// Prefix of the shared task channel name.
    pub task_channel_prefix: String,
    /// Prefix of the presence room name.
    pub presence_room_prefix: String,

    // -- Presence --
    /// Heartbeat, throttle and roster settings.
    pub presence: PresenceConfig,

    // -- Storage --
    /// JSON file backing persistent storage; `None` keeps it in memory.
    pub data_file: Option<PathBuf>,

    // -- Tasks --
    /// Seed a new workspace with the demo tasks.
    pub seed_demo_tasks: bool,

    // -- Runtime --
    /// Skip the sync collaborator entirely.
    pub offline: bool,
    /// Number of simulated peers joining the presence room.
    pub demo_peers: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            link: "http://localhost:5173/".to_string(),
            query_param: DEFAULT_QUERY_PARAM.to_string(),
            task_channel_prefix: "family-tasks".to_string(),
            presence_room_prefix: "family-presence".to_string(),
            presence: PresenceConfig::default(),
            data_file: default_data_file(),
            seed_demo_tasks: true,
            offline: false,
            demo_peers: 0,
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an
    /// error. Otherwise the default path (`~/.config/famtasks/config.toml`)
    /// is tried and silently ignored if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();
        let presence_defaults = defaults.presence;

        Self {
            link: cli
                .link
                .clone()
                .or_else(|| file.workspace.base_url.clone())
                .unwrap_or(defaults.link),
            query_param: file
                .workspace
                .query_param
                .clone()
                .unwrap_or(defaults.query_param),
            task_channel_prefix: file
                .workspace
                .task_channel_prefix
                .clone()
                .unwrap_or(defaults.task_channel_prefix),
            presence_room_prefix: file
                .workspace
                .presence_room_prefix
                .clone()
                .unwrap_or(defaults.presence_room_prefix),
            presence: PresenceConfig {
                heartbeat_interval: file
                    .presence
                    .heartbeat_secs
                    .map_or(presence_defaults.heartbeat_interval, |s| {
                        Duration::from_secs(s.max(1))
                    }),
                activity_throttle: file
                    .presence
                    .activity_throttle_secs
                    .map_or(presence_defaults.activity_throttle, Duration::from_secs),
                max_visible_peers: file
                    .presence
                    .max_visible_peers
                    .unwrap_or(presence_defaults.max_visible_peers),
            },
            data_file: cli
                .data_file
                .clone()
                .or_else(|| file.storage.data_file.clone())
                .or(defaults.data_file),
            seed_demo_tasks: file
                .tasks
                .seed_demo_tasks
                .unwrap_or(defaults.seed_demo_tasks),
            offline: cli.offline,
            demo_peers: cli.demo_peers,
        }
    }

    /// The starting location as a [`MemoryLocation`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLink`] if `link` is not an absolute URL.
    pub fn location(&self) -> Result<MemoryLocation, ConfigError> {
        Url::parse(&self.link)
            .map(MemoryLocation::new)
            .map_err(|source| ConfigError::InvalidLink {
                link: self.link.clone(),
                source,
            })
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Shared family task list with live presence")]
pub struct CliArgs {
    /// Invite link or base URL to open (joins the workspace it names).
    #[arg(long, env = "FAMTASKS_LINK")]
    pub link: Option<String>,

    /// Path to config file (default: `~/.config/famtasks/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// JSON file backing persistent storage.
    #[arg(long, env = "FAMTASKS_DATA")]
    pub data_file: Option<PathBuf>,

    /// Run without the sync collaborator (local-only mode).
    #[arg(long)]
    pub offline: bool,

    /// Join this many simulated family members to the presence room.
    #[arg(long, default_value_t = 0)]
    pub demo_peers: usize,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "FAMTASKS_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/famtasks.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn default_data_file() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("famtasks").join("storage.json"))
}

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    }

    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ConfigFile::default());
    };
    let path = config_dir.join("famtasks").join("config.toml");

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
