//! Task model shared by every participant of a workspace.
//!
//! The collection itself is owned by the sync collaborator; these types
//! only describe one record and the partial values used to create or
//! patch it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a task, unique within its collection.
///
/// Freshly created tasks get a UUID v7 string, so ids are derived from the
/// creation time and sort in creation order. Ids read from a shared
/// collection are kept verbatim, whatever their shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a new time-ordered task identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Progress of a task.
///
/// Statuses are cyclic: `Idle -> InProgress -> Done -> Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not started yet.
    Idle,
    /// Someone is working on it.
    InProgress,
    /// Finished.
    Done,
}

impl TaskStatus {
    /// Returns the status that follows this one in the cycle.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Idle => Self::InProgress,
            Self::InProgress => Self::Done,
            Self::Done => Self::Idle,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::InProgress => write!(f, "in-progress"),
            Self::Done => write!(f, "done"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "in-progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

/// One entry of the shared task list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier.
    pub id: TaskId,
    /// What needs to be done.
    pub title: String,
    /// Current progress.
    pub status: TaskStatus,
    /// Id of the catalog category the task is filed under.
    pub category: String,
    /// Creation time, milliseconds since epoch.
    pub created_at: u64,
    /// Last modification time, milliseconds since epoch. Never below `created_at`.
    pub updated_at: u64,
}

/// The caller-supplied part of a task; id and timestamps are stamped on add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    /// What needs to be done.
    pub title: String,
    /// Initial status.
    pub status: TaskStatus,
    /// Catalog category id.
    pub category: String,
}

impl NewTask {
    /// A fresh idle task in `category`.
    pub fn idle(title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status: TaskStatus::Idle,
            category: category.into(),
        }
    }
}

/// Field overrides applied by an update.
///
/// `None` leaves the field as it is. The id and the timestamps are not
/// patchable: the id must stay unique and `updated_at` is always stamped
/// by the update itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    /// Replacement title.
    pub title: Option<String>,
    /// Replacement status.
    pub status: Option<TaskStatus>,
    /// Replacement category id.
    pub category: Option<String>,
}

impl TaskPatch {
    /// A patch that only changes the status.
    #[must_use]
    pub const fn status(status: TaskStatus) -> Self {
        Self {
            title: None,
            status: Some(status),
            category: None,
        }
    }

    /// A patch that only changes the title.
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Applies the overrides to `task` in place. Timestamps are untouched.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title.clone_from(title);
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(category) = &self.category {
            task.category.clone_from(category);
        }
    }
}
