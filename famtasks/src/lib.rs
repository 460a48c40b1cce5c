//! Shared family task list with live presence.

pub mod avatar;
pub mod clock;
pub mod commands;
pub mod config;
pub mod identity;
pub mod presence;
pub mod session;
pub mod storage;
pub mod sync;
pub mod tasks;
pub mod workspace;
