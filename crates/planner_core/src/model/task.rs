//! Task and Reminder domain records plus their request shapes.
//!
//! # Responsibility
//! - Define the canonical task record owned by the store.
//! - Define creation drafts and the merge-patch payload for updates.
//!
//! # Invariants
//! - `id` and `created_at` are assigned once at creation and never change.
//! - `snoozes_acknowledged` stays within `[0, MAX_SNOOZES]`.
//! - A reminder belongs to exactly one task for its whole lifetime.

use crate::model::field::Field;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a task.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type TaskId = Uuid;

/// Stable identifier for a reminder.
pub type ReminderId = Uuid;

/// Upper bound on acknowledged snoozes per reminder.
pub const MAX_SNOOZES: u8 = 3;

/// Scheduled trigger owned by exactly one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    /// Stable global ID assigned by the core at creation.
    pub id: ReminderId,
    /// Back-reference to the owning task, not an ownership handle.
    pub task_id: TaskId,
    /// Trigger timestamp.
    pub time: DateTime<Utc>,
    /// Bounded in `[0, MAX_SNOOZES]`; managed by the core only.
    pub snoozes_acknowledged: u8,
}

impl Reminder {
    /// Creates a fresh reminder bound to `task_id` with a zeroed
    /// snooze counter.
    pub fn new(task_id: TaskId, time: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            time,
            snoozes_acknowledged: 0,
        }
    }

    /// Whether this reminder is still eligible for snoozing.
    pub fn can_snooze(&self) -> bool {
        self.snoozes_acknowledged < MAX_SNOOZES
    }
}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Stable global ID used for routing and auditing.
    pub id: TaskId,
    /// Creation timestamp, immutable once set.
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub subject: String,
    /// Free-form category tag (e.g. "Study", "Assignment", "Exam").
    /// Serialized as `type` to match external schema naming.
    #[serde(rename = "type")]
    pub category: String,
    pub due_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub is_completed: bool,
    /// Owned reminders; no duplicate ids. Kept in insertion order:
    /// surviving reminders first, newly created ones appended.
    pub reminders: Vec<Reminder>,
}

impl Task {
    /// Materializes a task from a creation draft.
    ///
    /// # Contract
    /// - Allocates a fresh `TaskId` and stamps `created_at = now`.
    /// - Every reminder draft gets a fresh id, this task's id and a
    ///   zeroed snooze counter.
    pub fn from_draft(draft: TaskDraft, now: DateTime<Utc>) -> Self {
        let id = Uuid::new_v4();
        let reminders = draft
            .reminders
            .into_iter()
            .map(|reminder| Reminder::new(id, reminder.time))
            .collect();
        Self {
            id,
            created_at: now,
            title: draft.title,
            subject: draft.subject,
            category: draft.category,
            due_date: draft.due_date,
            notes: draft.notes,
            is_completed: draft.is_completed,
            reminders,
        }
    }
}

/// Reminder creation request: the trigger time only, ids and counters
/// are managed by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderDraft {
    pub time: DateTime<Utc>,
}

/// Task creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub subject: String,
    #[serde(rename = "type")]
    pub category: String,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub reminders: Vec<ReminderDraft>,
}

/// One entry of the reminder upsert list.
///
/// With an `id` it targets an existing reminder (time overwrite when
/// supplied); without an `id` it requests a new reminder (dropped when
/// no time is supplied).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ReminderId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
}

/// Merge-patch payload for task updates.
///
/// Scalar fields use `Field` so that only keys present in the payload
/// take effect; `notes` is nullable and can be cleared with an
/// explicit `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Field::is_unset")]
    pub title: Field<String>,
    #[serde(skip_serializing_if = "Field::is_unset")]
    pub subject: Field<String>,
    #[serde(rename = "type", skip_serializing_if = "Field::is_unset")]
    pub category: Field<String>,
    #[serde(skip_serializing_if = "Field::is_unset")]
    pub due_date: Field<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Field::is_unset")]
    pub notes: Field<Option<String>>,
    #[serde(skip_serializing_if = "Field::is_unset")]
    pub is_completed: Field<bool>,
    /// Upsert list, processed in supplied order after removals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminders: Option<Vec<ReminderPatch>>,
    /// Reminder ids to delete; unknown ids are ignored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_reminder_ids: Option<Vec<ReminderId>>,
}

impl Default for TaskPatch {
    fn default() -> Self {
        Self {
            title: Field::Unset,
            subject: Field::Unset,
            category: Field::Unset,
            due_date: Field::Unset,
            notes: Field::Unset,
            is_completed: Field::Unset,
            reminders: None,
            remove_reminder_ids: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Field, Reminder, ReminderDraft, Task, TaskDraft, TaskPatch};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn draft() -> TaskDraft {
        TaskDraft {
            title: "Algebra homework".to_string(),
            subject: "Math".to_string(),
            category: "Assignment".to_string(),
            due_date: Utc.with_ymd_and_hms(2025, 5, 10, 18, 0, 0).unwrap(),
            notes: None,
            is_completed: false,
            reminders: vec![
                ReminderDraft {
                    time: Utc.with_ymd_and_hms(2025, 5, 10, 12, 0, 0).unwrap(),
                },
                ReminderDraft {
                    time: Utc.with_ymd_and_hms(2025, 5, 10, 16, 0, 0).unwrap(),
                },
            ],
        }
    }

    #[test]
    fn from_draft_binds_reminders_to_the_new_task() {
        let now = Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap();
        let task = Task::from_draft(draft(), now);

        assert_eq!(task.created_at, now);
        assert_eq!(task.reminders.len(), 2);
        for reminder in &task.reminders {
            assert_eq!(reminder.task_id, task.id);
            assert_eq!(reminder.snoozes_acknowledged, 0);
        }
        assert_ne!(task.reminders[0].id, task.reminders[1].id);
    }

    #[test]
    fn category_serializes_as_type() {
        let now = Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap();
        let task = Task::from_draft(draft(), now);
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["type"], "Assignment");
        assert!(value.get("category").is_none());
    }

    #[test]
    fn patch_distinguishes_absent_from_present_fields() {
        let patch: TaskPatch = serde_json::from_str(r#"{"title": "B"}"#).unwrap();
        assert_eq!(patch.title, Field::Set("B".to_string()));
        assert!(patch.subject.is_unset());
        assert!(patch.due_date.is_unset());
        assert!(patch.reminders.is_none());
    }

    #[test]
    fn patch_accepts_explicit_null_notes() {
        let patch: TaskPatch = serde_json::from_str(r#"{"notes": null}"#).unwrap();
        assert_eq!(patch.notes, Field::Set(None));
    }

    #[test]
    fn reminder_snooze_eligibility_tracks_the_cap() {
        let mut reminder = Reminder::new(
            Uuid::new_v4(),
            Utc.with_ymd_and_hms(2025, 5, 10, 12, 0, 0).unwrap(),
        );
        assert!(reminder.can_snooze());
        reminder.snoozes_acknowledged = 3;
        assert!(!reminder.can_snooze());
    }
}
