//! Shared data model for `famtasks`.
//!
//! Everything in here is plain serialisable data. The shared-state
//! collaborator carries these values as postcard-encoded snapshots.

pub mod category;
pub mod codec;
pub mod presence;
pub mod task;
