//! Task storage contract and in-memory implementation.
//!
//! # Responsibility
//! - Provide a durable-for-process-lifetime mapping from `TaskId` to
//!   task record.
//! - Keep listing deterministic (insertion order).
//!
//! # Invariants
//! - `insert` is insert-or-replace; a replaced record keeps its list slot.
//! - No internal locking; callers serialize access around whole
//!   operations when shared across threads.

use crate::model::task::{Task, TaskId};
use std::collections::HashMap;

/// Storage contract for task records.
pub trait TaskStore {
    /// Lists all tasks in insertion order.
    fn list(&self) -> Vec<Task>;
    /// Gets one task by id; absent ids are not an error.
    fn get(&self, id: TaskId) -> Option<Task>;
    /// Inserts or replaces the record under `task.id`.
    fn insert(&mut self, task: Task);
    /// Removes a record, returning whether one existed.
    fn remove(&mut self, id: TaskId) -> bool;
}

/// Process-lifetime map from task id to task record.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    records: HashMap<TaskId, Task>,
    // Insertion-order index; HashMap iteration order is unspecified.
    order: Vec<TaskId>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl TaskStore for InMemoryTaskStore {
    fn list(&self) -> Vec<Task> {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id).cloned())
            .collect()
    }

    fn get(&self, id: TaskId) -> Option<Task> {
        self.records.get(&id).cloned()
    }

    fn insert(&mut self, task: Task) {
        if !self.records.contains_key(&task.id) {
            self.order.push(task.id);
        }
        self.records.insert(task.id, task);
    }

    fn remove(&mut self, id: TaskId) -> bool {
        if self.records.remove(&id).is_some() {
            self.order.retain(|existing| *existing != id);
            return true;
        }
        false
    }
}
