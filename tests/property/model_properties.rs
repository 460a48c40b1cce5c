//! Property-based tests for the shared data model.
//!
//! Uses proptest to verify:
//! 1. The status cycle has period three.
//! 2. Applying a patch never touches the id or the timestamps.
//! 3. Task collections survive encode → decode.
//! 4. Random bytes never cause a panic in `decode`.

#![allow(clippy::unwrap_used)]

use famtasks_proto::codec;
use famtasks_proto::task::{Task, TaskId, TaskPatch, TaskStatus};
use proptest::prelude::*;

// --- Strategies ---

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::Idle),
        Just(TaskStatus::InProgress),
        Just(TaskStatus::Done),
    ]
}

fn arb_category() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("groceries".to_string()),
        Just("chores".to_string()),
        Just("errands".to_string()),
        Just("personal".to_string()),
        "[a-z]{1,12}",
    ]
}

/// Tasks with `created_at <= updated_at`.
fn arb_task() -> impl Strategy<Value = Task> {
    (
        "[a-z0-9-]{1,36}",
        "[^\x00]{1,80}",
        arb_status(),
        arb_category(),
        0..u64::MAX / 2,
        0..u64::MAX / 2,
    )
        .prop_map(|(id, title, status, category, created_at, delta)| Task {
            id: TaskId::from(id),
            title,
            status,
            category,
            created_at,
            updated_at: created_at + delta,
        })
}

fn arb_patch() -> impl Strategy<Value = TaskPatch> {
    (
        proptest::option::of("[^\x00]{1,80}"),
        proptest::option::of(arb_status()),
        proptest::option::of(arb_category()),
    )
        .prop_map(|(title, status, category)| TaskPatch {
            title,
            status,
            category,
        })
}

// --- Properties ---

proptest! {
    #[test]
    fn status_cycle_has_period_three(status in arb_status()) {
        prop_assert_eq!(status.next().next().next(), status);
        prop_assert_ne!(status.next(), status);
    }

    #[test]
    fn status_text_round_trips(status in arb_status()) {
        let parsed: TaskStatus = status.to_string().parse().unwrap();
        prop_assert_eq!(parsed, status);
    }

    #[test]
    fn patch_keeps_identity_and_timestamps(task in arb_task(), patch in arb_patch()) {
        let mut patched = task.clone();
        patch.apply_to(&mut patched);

        prop_assert_eq!(&patched.id, &task.id);
        prop_assert_eq!(patched.created_at, task.created_at);
        prop_assert_eq!(patched.updated_at, task.updated_at);
        prop_assert_eq!(patched.title, patch.title.clone().unwrap_or(task.title));
        prop_assert_eq!(patched.status, patch.status.unwrap_or(task.status));
    }

    #[test]
    fn empty_patch_is_identity(task in arb_task()) {
        let mut patched = task.clone();
        TaskPatch::default().apply_to(&mut patched);
        prop_assert_eq!(patched, task);
    }

    #[test]
    fn task_list_round_trips(tasks in prop::collection::vec(arb_task(), 0..16)) {
        let bytes = codec::encode(&tasks).unwrap();
        let decoded: Vec<Task> = codec::decode(&bytes).unwrap();
        prop_assert_eq!(decoded, tasks);
    }

    #[test]
    fn random_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = codec::decode::<Vec<Task>>(&bytes);
    }
}
