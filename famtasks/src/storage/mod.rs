//! Key-value persistence seam.
//!
//! Identity bootstrap talks to storage only through [`KeyValueStore`], so
//! the browser-style "local" (persistent) and "session" (process-lifetime)
//! scopes are just two store instances:
//! - [`MemoryStore`]: in-memory, lives as long as the process
//! - [`FileStore`]: JSON document on disk, survives restarts

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing document could not be parsed.
    #[error("storage document is corrupt: {0}")]
    Corrupt(String),

    /// The store refuses access (quota, permissions, disabled).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// String key-value storage.
///
/// Implementations must be safe to share between threads; every call is a
/// complete read or write, there are no transactions.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the value cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing storage cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
