//! External store seams the engine depends on.
//!
//! Persistence, identity, and calendar sync are owned by the host
//! application; the engine only sees these narrow traits. Implementations
//! must make `create_blocks` all-or-nothing and keep `version` monotonic so
//! the preview workflow's optimistic apply check is sound.

pub mod memory;

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::schedule::{ScheduleBlock, WorkingHoursPolicy};
use crate::task::{Task, TaskId, TaskStatus, UserId};

pub use memory::{InMemoryPolicyProvider, InMemoryScheduleStore, InMemoryTaskStore};

/// Read/write access to tasks.
pub trait TaskStore {
    /// Tasks eligible for scheduling: WAITING, plus MISSED tasks re-entering
    /// with their one-time priority boost.
    fn list_pending_tasks(&self, user: &UserId) -> Result<Vec<Task>, StoreError>;

    fn get_task(&self, id: &TaskId) -> Result<Task, StoreError>;

    /// Persist a status change. Transition validation happens in the engine
    /// before this is called. Implementations grant the one-time priority
    /// boost when the new status is MISSED.
    fn update_task_status(&mut self, id: &TaskId, status: TaskStatus) -> Result<(), StoreError>;

    /// Clear the one-time priority boost after a successful placement.
    fn consume_priority_boost(&mut self, id: &TaskId) -> Result<(), StoreError>;
}

/// Read/write access to committed schedule blocks.
pub trait ScheduleStore {
    fn list_blocks(
        &self,
        user: &UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ScheduleBlock>, StoreError>;

    /// Commit a batch of blocks. All-or-nothing: if any block cannot be
    /// committed, none are, and the call fails.
    fn create_blocks(&mut self, blocks: &[ScheduleBlock]) -> Result<(), StoreError>;

    /// Remove every block placing the given task. Returns how many went.
    fn delete_blocks_for_task(&mut self, task_id: &TaskId) -> Result<usize, StoreError>;

    /// Monotonic per-user version, bumped on every committed mutation. The
    /// preview workflow compares this against its snapshot before applying.
    fn version(&self, user: &UserId) -> Result<u64, StoreError>;
}

/// Access to per-user working-hours policies.
pub trait PolicyProvider {
    fn working_hours_policy(&self, user: &UserId) -> Result<WorkingHoursPolicy, StoreError>;
}
