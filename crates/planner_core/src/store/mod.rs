//! Storage layer abstractions and the in-memory implementation.
//!
//! # Responsibility
//! - Define the task storage contract used by the service layer.
//! - Keep record ownership in one place for process lifetime.
//!
//! # Invariants
//! - The store is the exclusive owner of all task and reminder records.
//! - Store operations are infallible; missing ids surface as `Option`
//!   or `bool`, never as errors.

pub mod task_store;
