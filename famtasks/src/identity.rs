//! Per-session user id and per-device display name.
//!
//! The user id lives in session-scoped storage, so every new session gets
//! a new one. The display name lives in persistent storage and survives
//! restarts; older versions kept it in session storage, and such values
//! are migrated on first read.

use std::sync::Arc;

use famtasks_proto::presence::{FORBIDDEN_NAME_CHARS, MAX_NAME_LENGTH};
use rand::Rng;

use crate::clock::now_ms;
use crate::storage::{KeyValueStore, StorageError};

/// Persistent (and legacy session) key holding the display name.
pub const USER_NAME_KEY: &str = "user-name";

/// Session key holding the session's user id.
pub const SESSION_ID_KEY: &str = "user-session-id";

const NAME_ADJECTIVES: [&str; 8] = [
    "Happy", "Bright", "Swift", "Kind", "Bold", "Wise", "Cool", "Smart",
];
const NAME_NOUNS: [&str; 8] = [
    "Alex", "Sam", "Jordan", "Casey", "Riley", "Morgan", "Quinn", "Taylor",
];
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Reasons a display name change is rejected.
#[derive(Debug, thiserror::Error)]
pub enum NameError {
    /// Nothing left after trimming.
    #[error("Name cannot be empty")]
    Empty,
    /// Longer than [`MAX_NAME_LENGTH`] characters.
    #[error("Name must be 30 characters or less")]
    TooLong,
    /// Contains one of [`FORBIDDEN_NAME_CHARS`].
    #[error("Name contains invalid characters")]
    InvalidCharacters,
    /// The name was valid but could not be persisted.
    #[error("could not save name: {0}")]
    Storage(#[from] StorageError),
}

impl NameError {
    /// Stable machine-readable code for the failure.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::TooLong => "too-long",
            Self::InvalidCharacters => "invalid-characters",
            Self::Storage(_) => "storage",
        }
    }
}

/// Who the local participant is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Session-scoped id, used as the presence peer id.
    pub user_id: String,
    /// Display name.
    pub user_name: String,
}

/// Checks a candidate display name and returns it trimmed.
///
/// # Errors
///
/// Returns [`NameError::Empty`], [`NameError::TooLong`] or
/// [`NameError::InvalidCharacters`]; never [`NameError::Storage`].
pub fn validate_user_name(candidate: &str) -> Result<String, NameError> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return Err(NameError::Empty);
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(NameError::TooLong);
    }
    if trimmed.contains(FORBIDDEN_NAME_CHARS) {
        return Err(NameError::InvalidCharacters);
    }
    Ok(trimmed.to_string())
}

/// Picks a friendly two-word name such as "Swift Riley".
pub fn random_user_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = NAME_ADJECTIVES[rng.random_range(0..NAME_ADJECTIVES.len())];
    let noun = NAME_NOUNS[rng.random_range(0..NAME_NOUNS.len())];
    format!("{adjective} {noun}")
}

/// Builds `user-<epoch ms>-<7 base36 chars>`.
pub fn new_session_id<R: Rng + ?Sized>(rng: &mut R, now: u64) -> String {
    let suffix: String = (0..7)
        .map(|_| char::from(BASE36[rng.random_range(0..BASE36.len())]))
        .collect();
    format!("user-{now}-{suffix}")
}

/// Identity bootstrap over a persistent and a session-scoped store.
#[derive(Clone)]
pub struct IdentityStore {
    persistent: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
}

impl IdentityStore {
    /// Creates a store reading and writing the given scopes.
    pub fn new(persistent: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Self {
        Self {
            persistent,
            session,
        }
    }

    /// Returns the session's user id, creating and caching one if needed.
    ///
    /// Stable for the lifetime of the session store. Storage failures are
    /// logged; the id is still returned but may not survive the next call.
    #[must_use]
    pub fn generate_user_id(&self) -> String {
        if let Some(id) = read(self.session.as_ref(), SESSION_ID_KEY) {
            return id;
        }
        let id = new_session_id(&mut rand::rng(), now_ms());
        if let Err(e) = self.session.set(SESSION_ID_KEY, &id) {
            tracing::warn!(error = %e, "could not cache session user id");
        }
        tracing::debug!(user_id = %id, "generated session user id");
        id
    }

    /// Returns the display name, generating and persisting one if needed.
    ///
    /// Lookup order: persistent storage, then the legacy session entry
    /// (copied into persistent storage), then a fresh random name.
    #[must_use]
    pub fn get_user_name(&self) -> String {
        if let Some(name) = read(self.persistent.as_ref(), USER_NAME_KEY) {
            return name;
        }

        if let Some(name) = read(self.session.as_ref(), USER_NAME_KEY) {
            if let Err(e) = self.persistent.set(USER_NAME_KEY, &name) {
                tracing::warn!(error = %e, "could not migrate session user name");
            } else {
                tracing::info!("migrated user name from session storage");
            }
            return name;
        }

        let name = random_user_name(&mut rand::rng());
        if let Err(e) = self.persistent.set(USER_NAME_KEY, &name) {
            tracing::warn!(error = %e, "could not persist generated user name");
            // Keep the name stable for the rest of the session.
            if let Err(e) = self.session.set(USER_NAME_KEY, &name) {
                tracing::warn!(error = %e, "could not cache generated user name");
            }
        }
        name
    }

    /// Validates and stores a new display name, returning the trimmed value.
    ///
    /// Nothing is written unless validation passes.
    ///
    /// # Errors
    ///
    /// Returns a validation [`NameError`], or [`NameError::Storage`] if the
    /// persistent write fails.
    pub fn set_user_name(&self, candidate: &str) -> Result<String, NameError> {
        let name = validate_user_name(candidate)?;
        self.persistent.set(USER_NAME_KEY, &name)?;
        if let Err(e) = self.session.set(USER_NAME_KEY, &name) {
            tracing::warn!(error = %e, "could not mirror user name into session storage");
        }
        Ok(name)
    }

    /// Resolves both halves of the identity.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.generate_user_id(),
            user_name: self.get_user_name(),
        }
    }
}

/// Reads a non-empty value, logging and ignoring storage failures.
fn read(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value.filter(|v| !v.is_empty()),
        Err(e) => {
            tracing::warn!(key, error = %e, "storage read failed, treating as missing");
            None
        }
    }
}
