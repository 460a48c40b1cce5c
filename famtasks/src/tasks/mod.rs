//! The shared family task list.
//!
//! Every mutation is a pure "current collection -> next collection"
//! transformation ([`ops`]); [`TaskList`] hands those transformations to
//! the sync collaborator so concurrent writers never clobber each other
//! with stale copies.

pub mod list;
pub mod ops;

pub use list::TaskList;
pub use ops::{
    SHORT_ID_LEN, add_task, cycle_status, delete_task, find_by_fragment, normalize_title, seed_tasks,
    short_id, tasks_in_category, update_task,
};

use thiserror::Error;

use crate::sync::SyncError;

/// Errors that can occur during task operations.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Task title is empty after trimming.
    #[error("task title cannot be empty")]
    TitleEmpty,
    /// The new collection could not be published.
    #[error(transparent)]
    Sync(#[from] SyncError),
}
