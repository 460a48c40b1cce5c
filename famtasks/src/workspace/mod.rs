//! Workspace resolution from the addressable location.
//!
//! The workspace id travels in a query parameter of the current location
//! (`?family=sunny-crew-42`). Once written there it survives reloads, and
//! the full location doubles as the invite link.

pub mod clipboard;

use std::sync::Arc;

use parking_lot::RwLock;
use rand::Rng;
use url::Url;

pub use clipboard::{Clipboard, ClipboardError, Osc52Clipboard};

/// Default query parameter carrying the workspace id.
pub const DEFAULT_QUERY_PARAM: &str = "family";

const WORKSPACE_ADJECTIVES: [&str; 8] = [
    "happy", "sunny", "bright", "swift", "cool", "smart", "kind", "bold",
];
const WORKSPACE_NOUNS: [&str; 8] = [
    "family", "team", "group", "squad", "crew", "tribe", "clan", "house",
];

/// The current addressable location.
///
/// `replace` swaps the location in place, like a history replacement:
/// nothing is reloaded or navigated.
pub trait Location: Send + Sync {
    /// The current location.
    fn href(&self) -> Url;

    /// Replaces the current location.
    fn replace(&self, url: Url);
}

/// A location held in memory.
#[derive(Debug)]
pub struct MemoryLocation {
    url: RwLock<Url>,
}

impl MemoryLocation {
    /// Starts at `url`.
    #[must_use]
    pub const fn new(url: Url) -> Self {
        Self {
            url: RwLock::new(url),
        }
    }

    /// Parses `href` and starts there.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] if `href` is not an absolute URL.
    pub fn parse(href: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(href)?))
    }
}

impl Location for MemoryLocation {
    fn href(&self) -> Url {
        self.url.read().clone()
    }

    fn replace(&self, url: Url) {
        *self.url.write() = url;
    }
}

/// Generates an id such as `swift-crew-417`.
pub fn generate_workspace_id_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = WORKSPACE_ADJECTIVES[rng.random_range(0..WORKSPACE_ADJECTIVES.len())];
    let noun = WORKSPACE_NOUNS[rng.random_range(0..WORKSPACE_NOUNS.len())];
    let number: u16 = rng.random_range(0..1000);
    format!("{adjective}-{noun}-{number}")
}

/// Generates a workspace id from the thread-local RNG.
#[must_use]
pub fn generate_workspace_id() -> String {
    generate_workspace_id_with(&mut rand::rng())
}

/// Reads and writes the workspace id in a [`Location`].
#[derive(Clone)]
pub struct WorkspaceResolver {
    location: Arc<dyn Location>,
    param: String,
}

impl WorkspaceResolver {
    /// Resolver using the `param` query parameter of `location`.
    pub fn new(location: Arc<dyn Location>, param: impl Into<String>) -> Self {
        Self {
            location,
            param: param.into(),
        }
    }

    /// Returns the workspace id in the location, if present and non-empty.
    #[must_use]
    pub fn get_workspace_id(&self) -> Option<String> {
        self.location
            .href()
            .query_pairs()
            .find(|(key, _)| key == self.param.as_str())
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    }

    /// Writes `id` into the location, keeping every other parameter.
    pub fn set_workspace_id(&self, id: &str) {
        let mut url = self.location.href();
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != self.param.as_str())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair(&self.param, id);
        self.location.replace(url);
    }

    /// Returns the existing workspace id or creates one and writes it back.
    ///
    /// After the first call the id is part of the location, so subsequent
    /// calls (and reloads of that location) return the same value.
    #[must_use]
    pub fn get_or_create_workspace_id(&self) -> String {
        if let Some(id) = self.get_workspace_id() {
            return id;
        }
        let id = generate_workspace_id();
        self.set_workspace_id(&id);
        tracing::info!(workspace_id = %id, "created new workspace");
        id
    }

    /// The shareable link: the full current location.
    #[must_use]
    pub fn get_invite_link(&self) -> String {
        self.location.href().to_string()
    }

    /// Copies the invite link with `clipboard`.
    ///
    /// Returns whether the copy succeeded. Failures are logged and
    /// otherwise ignored.
    pub fn copy_invite_link(&self, clipboard: &dyn Clipboard) -> bool {
        match clipboard.write_text(&self.get_invite_link()) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "failed to copy invite link");
                false
            }
        }
    }
}

/// Name of the shared-state channel holding a workspace's tasks.
#[must_use]
pub fn task_channel(prefix: &str, workspace_id: &str) -> String {
    format!("{prefix}-{workspace_id}")
}

/// Name of the presence room of a workspace.
#[must_use]
pub fn presence_room(prefix: &str, workspace_id: &str) -> String {
    format!("{prefix}-{workspace_id}")
}
