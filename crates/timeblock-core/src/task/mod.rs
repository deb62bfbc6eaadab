//! Task types and the status state machine.
//!
//! Statuses follow strict transitions:
//!
//!   WAITING ──────> SCHEDULED ──────> IN_PROGRESS ──────> COMPLETED
//!      ^                |    <────────────┘ (pause)
//!      |                v
//!      +──────────── MISSED
//!
//! Valid transitions:
//! - WAITING → SCHEDULED, IN_PROGRESS, COMPLETED
//! - SCHEDULED → IN_PROGRESS, COMPLETED, MISSED
//! - IN_PROGRESS → COMPLETED, SCHEDULED (pause; the existing block is kept)
//! - MISSED → WAITING, SCHEDULED
//! - COMPLETED is terminal; reopening is not supported.
//!
//! SPLIT is a structural marker assigned by split call sites directly; the
//! transition validator rejects moving into or out of it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier for a task.
pub type TaskId = String;

/// Unique identifier for a user.
pub type UserId = String;

/// Task priority, highest first.
///
/// The derived order ranks `Urgent` lowest, so an ascending sort places the
/// most urgent tasks first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskPriority {
    Urgent,
    High,
    Medium,
    Low,
}

impl TaskPriority {
    /// Numeric rank, URGENT = 0 through LOW = 3.
    pub fn rank(self) -> u8 {
        match self {
            TaskPriority::Urgent => 0,
            TaskPriority::High => 1,
            TaskPriority::Medium => 2,
            TaskPriority::Low => 3,
        }
    }

    /// One rank toward URGENT; URGENT stays URGENT.
    pub fn boosted(self) -> Self {
        match self {
            TaskPriority::Low => TaskPriority::Medium,
            TaskPriority::Medium => TaskPriority::High,
            TaskPriority::High | TaskPriority::Urgent => TaskPriority::Urgent,
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

/// Category of task, used for optional same-category grouping during
/// placement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Work,
    Study,
    Personal,
    Health,
    Other,
}

impl Default for TaskCategory {
    fn default() -> Self {
        TaskCategory::Other
    }
}

/// Task status enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Not yet placed on the calendar (initial state)
    Waiting,
    /// Placed on the calendar with a committed block
    Scheduled,
    /// Currently being worked on
    InProgress,
    /// Block end passed beyond the grace period without completion
    Missed,
    /// Finished (terminal state)
    Completed,
    /// Structural marker for a task decomposed into sub-tasks
    Split,
}

impl TaskStatus {
    /// Check if a transition is valid.
    pub fn can_transition_to(&self, to: &TaskStatus) -> bool {
        match self {
            TaskStatus::Waiting => matches!(
                to,
                TaskStatus::Scheduled | TaskStatus::InProgress | TaskStatus::Completed
            ),
            TaskStatus::Scheduled => matches!(
                to,
                TaskStatus::InProgress | TaskStatus::Completed | TaskStatus::Missed
            ),
            TaskStatus::InProgress => {
                matches!(to, TaskStatus::Completed | TaskStatus::Scheduled)
            }
            TaskStatus::Missed => matches!(to, TaskStatus::Waiting | TaskStatus::Scheduled),
            TaskStatus::Completed => false, // Terminal state
            TaskStatus::Split => false,     // Structural marker, not a live state
        }
    }

    /// Get valid next statuses for this status.
    pub fn valid_transitions(&self) -> &[TaskStatus] {
        match self {
            TaskStatus::Waiting => &[
                TaskStatus::Scheduled,
                TaskStatus::InProgress,
                TaskStatus::Completed,
            ],
            TaskStatus::Scheduled => &[
                TaskStatus::InProgress,
                TaskStatus::Completed,
                TaskStatus::Missed,
            ],
            TaskStatus::InProgress => &[TaskStatus::Completed, TaskStatus::Scheduled],
            TaskStatus::Missed => &[TaskStatus::Waiting, TaskStatus::Scheduled],
            TaskStatus::Completed => &[],
            TaskStatus::Split => &[],
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Waiting
    }
}

/// Error returned when an invalid status transition is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("Invalid status transition: {from:?} → {to:?}")]
pub struct TransitionError {
    pub from: TaskStatus,
    pub to: TaskStatus,
}

/// A schedulable unit of work.
///
/// Tasks are owned by the external task store; the engine treats them as
/// read-mostly input. `parent_task_id` and the split indexes are populated
/// when the task is itself a sub-block carved from a larger original task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,
    /// Owning user
    pub user_id: UserId,
    /// Task title
    pub title: String,
    /// Estimated duration in minutes
    pub duration_minutes: u32,
    /// Category for grouping
    #[serde(default)]
    pub category: TaskCategory,
    /// Priority
    #[serde(default)]
    pub priority: TaskPriority,
    /// Optional deadline; a placed block must end on or before it
    pub deadline: Option<DateTime<Utc>>,
    /// Current status
    #[serde(default)]
    pub status: TaskStatus,
    /// One-time rank bump granted when the task was missed
    #[serde(default)]
    pub priority_boost: bool,
    /// Parent task when this task is a split segment
    pub parent_task_id: Option<TaskId>,
    /// 1-based index among the parent's split segments
    pub split_index: Option<u32>,
    /// Total number of split segments under the parent
    pub split_total: Option<u32>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new WAITING task with default priority and category.
    pub fn new(user_id: impl Into<UserId>, title: impl Into<String>, duration_minutes: u32) -> Self {
        let now = Utc::now();
        Task {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            title: title.into(),
            duration_minutes,
            category: TaskCategory::default(),
            priority: TaskPriority::default(),
            deadline: None,
            status: TaskStatus::Waiting,
            priority_boost: false,
            parent_task_id: None,
            split_index: None,
            split_total: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set priority
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set category
    pub fn with_category(mut self, category: TaskCategory) -> Self {
        self.category = category;
        self
    }

    /// Set deadline
    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set creation timestamp (the prioritizer breaks ties on recency)
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Priority after applying the one-time missed-task boost.
    pub fn effective_priority(&self) -> TaskPriority {
        if self.priority_boost {
            self.priority.boosted()
        } else {
            self.priority
        }
    }

    /// Transition to a new status.
    ///
    /// Returns an error if the transition is not in the table; the status is
    /// left unchanged. Moving into MISSED grants the one-time priority boost
    /// the task carries back into scheduling.
    pub fn transition_to(&mut self, new_status: TaskStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(&new_status) {
            return Err(TransitionError {
                from: self.status,
                to: new_status,
            });
        }

        if new_status == TaskStatus::Missed {
            self.priority_boost = true;
        }

        self.status = new_status;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Clear the one-time priority boost after a successful placement.
    pub fn consume_priority_boost(&mut self) {
        if self.priority_boost {
            self.priority_boost = false;
            self.updated_at = Utc::now();
        }
    }
}
