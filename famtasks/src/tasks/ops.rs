//! Pure transformations over a task collection.
//!
//! Each function takes the current collection and returns the next one,
//! leaving its input untouched. Operations addressing an id that is not in
//! the collection return an equal copy.

use famtasks_proto::task::{NewTask, Task, TaskId, TaskPatch, TaskStatus};

use super::TaskError;

const MINUTE_MS: u64 = 60_000;

/// Trims `title`, rejecting titles with nothing left.
///
/// # Errors
///
/// Returns [`TaskError::TitleEmpty`] for blank titles.
pub fn normalize_title(title: &str) -> Result<String, TaskError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TaskError::TitleEmpty);
    }
    Ok(trimmed.to_string())
}

/// Appends a task built from `new`, stamped with `id` and `now`.
#[must_use]
pub fn add_task(current: &[Task], new: NewTask, id: TaskId, now: u64) -> Vec<Task> {
    let mut next = current.to_vec();
    next.push(Task {
        id,
        title: new.title,
        status: new.status,
        category: new.category,
        created_at: now,
        updated_at: now,
    });
    next
}

/// Applies `patch` to the task with `id` and stamps its `updated_at`.
///
/// `updated_at` never moves backwards, even when `now` lags a peer's clock.
#[must_use]
pub fn update_task(current: &[Task], id: &TaskId, patch: &TaskPatch, now: u64) -> Vec<Task> {
    current
        .iter()
        .map(|task| {
            if &task.id != id {
                return task.clone();
            }
            let mut updated = task.clone();
            patch.apply_to(&mut updated);
            updated.updated_at = now.max(updated.updated_at);
            updated
        })
        .collect()
}

/// Removes the task with `id`.
#[must_use]
pub fn delete_task(current: &[Task], id: &TaskId) -> Vec<Task> {
    current.iter().filter(|task| &task.id != id).cloned().collect()
}

/// Advances the status of the task with `id` one step along its cycle.
#[must_use]
pub fn cycle_status(current: &[Task], id: &TaskId, now: u64) -> Vec<Task> {
    let Some(task) = current.iter().find(|task| &task.id == id) else {
        return current.to_vec();
    };
    update_task(current, id, &TaskPatch::status(task.status.next()), now)
}

/// Tasks filed under `category_id`, in collection order.
#[must_use]
pub fn tasks_in_category<'a>(tasks: &'a [Task], category_id: &str) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|task| task.category == category_id)
        .collect()
}

/// Number of trailing id characters shown to users.
pub const SHORT_ID_LEN: usize = 8;

/// The tail of `id` users type to address a task.
///
/// Generated ids share their leading timestamp bits, so the tail is what
/// tells them apart.
#[must_use]
pub fn short_id(id: &TaskId) -> &str {
    let id = id.as_str();
    let start = id
        .char_indices()
        .rev()
        .nth(SHORT_ID_LEN - 1)
        .map_or(0, |(i, _)| i);
    &id[start..]
}

/// The task whose id is `fragment`, or the only one whose id starts or
/// ends with it.
#[must_use]
pub fn find_by_fragment<'a>(tasks: &'a [Task], fragment: &str) -> Option<&'a Task> {
    if fragment.is_empty() {
        return None;
    }
    if let Some(exact) = tasks.iter().find(|task| task.id.as_str() == fragment) {
        return Some(exact);
    }
    let mut matches = tasks.iter().filter(|task| {
        let id = task.id.as_str();
        id.starts_with(fragment) || id.ends_with(fragment)
    });
    let first = matches.next()?;
    matches.next().is_none().then_some(first)
}

/// The demo tasks a brand new workspace starts with.
#[must_use]
pub fn seed_tasks(now: u64) -> Vec<Task> {
    let ago = |minutes: u64| now.saturating_sub(minutes * MINUTE_MS);
    vec![
        seed_task("1", "Buy milk and eggs", TaskStatus::Idle, "groceries", (ago(60), ago(60))),
        seed_task("2", "Clean the kitchen", TaskStatus::InProgress, "chores", (ago(120), ago(30))),
        seed_task("3", "Pick up dry cleaning", TaskStatus::Done, "errands", (ago(180), ago(15))),
        seed_task("4", "Vacuum living room", TaskStatus::Idle, "chores", (ago(240), ago(240))),
    ]
}

fn seed_task(
    id: &str,
    title: &str,
    status: TaskStatus,
    category: &str,
    (created_at, updated_at): (u64, u64),
) -> Task {
    Task {
        id: TaskId::from(id),
        title: title.to_string(),
        status,
        category: category.to_string(),
        created_at,
        updated_at,
    }
}
