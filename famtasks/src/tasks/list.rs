//! Task list bound to a shared-state channel.

use famtasks_proto::task::{NewTask, Task, TaskId, TaskPatch, TaskStatus};
use tokio::sync::watch;

use super::{TaskError, ops};
use crate::clock::now_ms;
use crate::sync::{SharedState, SyncBackend, SyncError, SyncStatus};

/// The workspace's task collection.
///
/// Reads return the latest known collection; writes hand a pure
/// transformation to the collaborator, so they apply on top of whatever
/// the collaborator currently holds.
pub struct TaskList {
    state: SharedState<Vec<Task>>,
}

impl TaskList {
    /// Wraps an existing binding.
    #[must_use]
    pub const fn new(state: SharedState<Vec<Task>>) -> Self {
        Self { state }
    }

    /// Binds to `channel` on `backend`, seeding it with `initial`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the backend refuses the channel.
    pub fn bind(
        backend: &dyn SyncBackend,
        channel: &str,
        initial: Vec<Task>,
    ) -> Result<Self, SyncError> {
        SharedState::bind(backend, channel, initial).map(Self::new)
    }

    /// A list that lives only in this process.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Codec`] if `initial` cannot be encoded.
    pub fn local(channel: &str, initial: Vec<Task>) -> Result<Self, SyncError> {
        SharedState::local(channel, initial).map(Self::new)
    }

    /// Snapshot of the collection.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.state.current()
    }

    /// The task with `id`, if present.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.tasks().into_iter().find(|task| &task.id == id)
    }

    /// Adds a task and returns its freshly generated id.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::TitleEmpty`] for blank titles, or
    /// [`TaskError::Sync`] if the collection could not be published.
    pub fn add(&self, new: NewTask) -> Result<TaskId, TaskError> {
        let title = ops::normalize_title(&new.title)?;
        let new = NewTask { title, ..new };
        let id = TaskId::generate();
        let now = now_ms();
        self.state
            .replace(|current| ops::add_task(current, new.clone(), id.clone(), now))?;
        tracing::debug!(task_id = %id, category = %new.category, "task added");
        Ok(id)
    }

    /// Applies `patch` to the task with `id`. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::TitleEmpty`] if the patch carries a blank
    /// title, or [`TaskError::Sync`] if the collection could not be
    /// published.
    pub fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<(), TaskError> {
        let patch = match patch.title.as_deref() {
            Some(title) => TaskPatch {
                title: Some(ops::normalize_title(title)?),
                ..patch
            },
            None => patch,
        };
        let now = now_ms();
        self.state
            .replace(|current| ops::update_task(current, id, &patch, now))?;
        Ok(())
    }

    /// Removes the task with `id`. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Sync`] if the collection could not be published.
    pub fn delete(&self, id: &TaskId) -> Result<(), TaskError> {
        self.state.replace(|current| ops::delete_task(current, id))?;
        tracing::debug!(task_id = %id, "task deleted");
        Ok(())
    }

    /// Advances the status of the task with `id` and returns the status it
    /// ended up with, or `None` if no such task exists.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Sync`] if the collection could not be published.
    pub fn cycle(&self, id: &TaskId) -> Result<Option<TaskStatus>, TaskError> {
        let now = now_ms();
        self.state
            .replace(|current| ops::cycle_status(current, id, now))?;
        Ok(self.get(id).map(|task| task.status))
    }

    /// Readiness of the underlying channel.
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        self.state.status()
    }

    /// Name of the underlying channel.
    #[must_use]
    pub fn channel_name(&self) -> &str {
        self.state.channel_name()
    }

    /// Fires whenever the collection changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.state.subscribe()
    }
}
