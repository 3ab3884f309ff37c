//! Domain model for tasks and their reminders.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Define the request/patch shapes accepted by task operations.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId` assigned at creation.
//! - A task's reminder set never contains duplicate reminder ids.

pub mod field;
pub mod task;
