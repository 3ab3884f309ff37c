//! Core domain logic for the planner backend.
//! This crate is the single source of truth for business invariants.

pub mod clock;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::field::Field;
pub use model::task::{
    Reminder, ReminderDraft, ReminderId, ReminderPatch, Task, TaskDraft, TaskId, TaskPatch,
    MAX_SNOOZES,
};
pub use service::task_service::{
    TaskService, TaskServiceError, TaskServiceResult, SNOOZE_DELAY_MINUTES,
};
pub use store::task_store::{InMemoryTaskStore, TaskStore};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
