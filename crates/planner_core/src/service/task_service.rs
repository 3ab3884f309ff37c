//! Task use-case service: CRUD plus snooze acknowledgement.
//!
//! # Responsibility
//! - Provide stable create/list/get/update/delete/acknowledge entry
//!   points over a `TaskStore`.
//! - Implement reminder reconciliation for merge-patch updates.
//!
//! # Invariants
//! - `TaskNotFound` is the only service-level error; anomalies inside
//!   a known task (unknown reminder ids, empty reminder lists, capped
//!   snooze counters) are silent no-ops by policy.
//! - Reminder reconciliation runs the removal pass before the upsert
//!   pass; an id deleted by the removal pass no longer matches in the
//!   upsert pass, so removal wins for that identifier.
//! - Final reminder order: surviving reminders in their prior order,
//!   then creations in supplied order.

use crate::clock::{Clock, SystemClock};
use crate::model::task::{Reminder, ReminderId, ReminderPatch, Task, TaskDraft, TaskId, TaskPatch};
use crate::store::task_store::TaskStore;
use chrono::Duration;
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Snooze deferral interval applied by `acknowledge_snooze`.
pub const SNOOZE_DELAY_MINUTES: i64 = 15;

pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Service error for task use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskServiceError {
    /// Operation referenced a task id absent from the store.
    TaskNotFound(TaskId),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskNotFound(task_id) => write!(f, "task not found: {task_id}"),
        }
    }
}

impl Error for TaskServiceError {}

/// Task service facade over store implementations.
pub struct TaskService<S: TaskStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
}

impl<S: TaskStore> TaskService<S> {
    /// Creates a service over `store` using the system clock.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: TaskStore, C: Clock> TaskService<S, C> {
    /// Creates a service with an injected time source.
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Creates a task and its reminders from a draft.
    ///
    /// # Contract
    /// - Allocates fresh ids for the task and every reminder draft.
    /// - Stamps `created_at` from the service clock.
    /// - Returns the fully materialized task.
    pub fn create_task(&mut self, draft: TaskDraft) -> Task {
        let task = Task::from_draft(draft, self.clock.now());
        info!(
            "event=task_created module=core status=ok task_id={} reminders={}",
            task.id,
            task.reminders.len()
        );
        self.store.insert(task.clone());
        task
    }

    /// Lists all tasks in insertion order.
    pub fn list_tasks(&self) -> Vec<Task> {
        self.store.list()
    }

    /// Gets one task by id; an absent id is not an error.
    pub fn get_task(&self, id: TaskId) -> Option<Task> {
        self.store.get(id)
    }

    /// Applies a merge-patch update and reconciles reminders.
    ///
    /// # Contract
    /// - Scalar fields absent from the patch are left untouched.
    /// - Reminder removal runs before the upsert pass; unknown ids in
    ///   the remove-list are ignored.
    /// - Upsert entries are processed in supplied order: a matching id
    ///   overwrites the trigger time when one is supplied (and is a
    ///   no-op otherwise); an entry without an id creates a new
    ///   reminder when it carries a time, and is dropped otherwise.
    /// - An entry whose id matches nothing (unknown, or deleted by the
    ///   removal pass) is dropped; it never resurrects the reminder.
    ///
    /// # Errors
    /// - `TaskNotFound` when `id` is unknown.
    pub fn update_task(&mut self, id: TaskId, patch: TaskPatch) -> TaskServiceResult<Task> {
        let mut task = self
            .store
            .get(id)
            .ok_or(TaskServiceError::TaskNotFound(id))?;

        let TaskPatch {
            title,
            subject,
            category,
            due_date,
            notes,
            is_completed,
            reminders,
            remove_reminder_ids,
        } = patch;

        title.apply(&mut task.title);
        subject.apply(&mut task.subject);
        category.apply(&mut task.category);
        due_date.apply(&mut task.due_date);
        notes.apply(&mut task.notes);
        is_completed.apply(&mut task.is_completed);

        task.reminders = reconcile_reminders(
            id,
            std::mem::take(&mut task.reminders),
            remove_reminder_ids,
            reminders,
        );

        info!(
            "event=task_updated module=core status=ok task_id={} reminders={}",
            task.id,
            task.reminders.len()
        );
        self.store.insert(task.clone());
        Ok(task)
    }

    /// Deletes a task; owned reminders go with the record.
    ///
    /// Returns whether a task existed to delete.
    pub fn delete_task(&mut self, id: TaskId) -> bool {
        let removed = self.store.remove(id);
        if removed {
            info!("event=task_deleted module=core status=ok task_id={id}");
        } else {
            debug!("event=task_delete_miss module=core task_id={id}");
        }
        removed
    }

    /// Snoozes the next reminder that would fire.
    ///
    /// # Contract
    /// - Among reminders with a snooze counter strictly below
    ///   `MAX_SNOOZES`, picks the earliest trigger time (first of
    ///   ties), increments its counter and reschedules it to
    ///   now + `SNOOZE_DELAY_MINUTES`.
    /// - A task with no reminders, or with every counter at the cap,
    ///   is returned unchanged.
    ///
    /// # Errors
    /// - `TaskNotFound` when `id` is unknown.
    pub fn acknowledge_snooze(&mut self, id: TaskId) -> TaskServiceResult<Task> {
        let mut task = self
            .store
            .get(id)
            .ok_or(TaskServiceError::TaskNotFound(id))?;

        if let Some(reminder) = next_snoozable(&mut task.reminders) {
            reminder.snoozes_acknowledged += 1;
            reminder.time = self.clock.now() + Duration::minutes(SNOOZE_DELAY_MINUTES);
            info!(
                "event=reminder_snoozed module=core status=ok task_id={} reminder_id={} count={}",
                id, reminder.id, reminder.snoozes_acknowledged
            );
            self.store.insert(task.clone());
        } else {
            debug!("event=snooze_noop module=core task_id={id}");
        }

        Ok(task)
    }
}

/// Merges removal and upsert lists into a task's reminder set.
///
/// Two independent passes over a working copy of the current set, in
/// the order documented on `TaskService::update_task`.
fn reconcile_reminders(
    task_id: TaskId,
    current: Vec<Reminder>,
    remove_ids: Option<Vec<ReminderId>>,
    upserts: Option<Vec<ReminderPatch>>,
) -> Vec<Reminder> {
    let mut working = current;

    if let Some(remove_ids) = remove_ids {
        working.retain(|reminder| !remove_ids.contains(&reminder.id));
    }

    if let Some(entries) = upserts {
        for entry in entries {
            match entry.id {
                Some(id) => {
                    // Known id: overwrite the time when one is supplied.
                    // An id that matches nothing (unknown, or just
                    // removed) falls through without creating anything.
                    if let Some(existing) = working.iter_mut().find(|r| r.id == id) {
                        if let Some(time) = entry.time {
                            existing.time = time;
                        }
                    }
                }
                None => {
                    if let Some(time) = entry.time {
                        working.push(Reminder::new(task_id, time));
                    }
                    // No id and no time: nothing to do.
                }
            }
        }
    }

    working
}

/// Picks the earliest reminder still eligible for snoozing.
///
/// Ties resolve to the first qualifying reminder in set order.
fn next_snoozable(reminders: &mut [Reminder]) -> Option<&mut Reminder> {
    let mut best: Option<usize> = None;
    for (index, reminder) in reminders.iter().enumerate() {
        if !reminder.can_snooze() {
            continue;
        }
        match best {
            Some(current) if reminders[current].time <= reminder.time => {}
            _ => best = Some(index),
        }
    }
    best.map(|index| &mut reminders[index])
}
