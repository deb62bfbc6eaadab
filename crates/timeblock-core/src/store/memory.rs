//! In-memory store implementations.
//!
//! Id-indexed maps standing in for a real backend: enough for tests, the
//! CLI driver, and any host that keeps its working set in process. The
//! schedule store enforces the committed no-double-booking invariant at the
//! commit seam and bumps a per-user version on every mutation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::conflict;
use crate::error::StoreError;
use crate::schedule::{BlockId, ScheduleBlock, WorkingHoursPolicy};
use crate::task::{Task, TaskId, TaskStatus, UserId};

use super::{PolicyProvider, ScheduleStore, TaskStore};

/// In-memory task store.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    tasks: HashMap<TaskId, Task>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a task.
    pub fn insert(&mut self, task: Task) {
        self.tasks.insert(task.id.clone(), task);
    }

    /// All tasks, in no particular order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }
}

impl TaskStore for InMemoryTaskStore {
    fn list_pending_tasks(&self, user: &UserId) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .tasks
            .values()
            .filter(|t| t.user_id == *user)
            .filter(|t| matches!(t.status, TaskStatus::Waiting | TaskStatus::Missed))
            .cloned()
            .collect())
    }

    fn get_task(&self, id: &TaskId) -> Result<Task, StoreError> {
        self.tasks
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::TaskNotFound(id.clone()))
    }

    fn update_task_status(&mut self, id: &TaskId, status: TaskStatus) -> Result<(), StoreError> {
        let task = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| StoreError::TaskNotFound(id.clone()))?;
        task.status = status;
        if status == TaskStatus::Missed {
            task.priority_boost = true;
        }
        task.updated_at = Utc::now();
        Ok(())
    }

    fn consume_priority_boost(&mut self, id: &TaskId) -> Result<(), StoreError> {
        let task = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| StoreError::TaskNotFound(id.clone()))?;
        task.consume_priority_boost();
        Ok(())
    }
}

/// In-memory schedule store.
#[derive(Debug, Default)]
pub struct InMemoryScheduleStore {
    blocks: HashMap<BlockId, ScheduleBlock>,
    versions: HashMap<UserId, u64>,
}

impl InMemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a committed block without the batch validation, bumping the
    /// owner's version.
    pub fn insert(&mut self, block: ScheduleBlock) {
        self.bump(&block.user_id);
        self.blocks.insert(block.id.clone(), block);
    }

    /// All blocks, in no particular order.
    pub fn blocks(&self) -> impl Iterator<Item = &ScheduleBlock> {
        self.blocks.values()
    }

    fn bump(&mut self, user: &UserId) {
        *self.versions.entry(user.clone()).or_insert(0) += 1;
    }
}

impl ScheduleStore for InMemoryScheduleStore {
    fn list_blocks(
        &self,
        user: &UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ScheduleBlock>, StoreError> {
        let mut blocks: Vec<ScheduleBlock> = self
            .blocks
            .values()
            .filter(|b| b.user_id == *user)
            .filter(|b| conflict::overlaps(b.start_time, b.end_time, from, to))
            .cloned()
            .collect();
        blocks.sort_by_key(|b| b.start_time);
        Ok(blocks)
    }

    fn create_blocks(&mut self, blocks: &[ScheduleBlock]) -> Result<(), StoreError> {
        // validate the whole batch before touching anything
        for (i, block) in blocks.iter().enumerate() {
            if block.end_time <= block.start_time {
                return Err(StoreError::CommitRejected(format!(
                    "block '{}' has an empty time range",
                    block.id
                )));
            }
            for other in self.blocks.values().filter(|b| b.user_id == block.user_id) {
                if block.overlaps(other) {
                    return Err(StoreError::CommitRejected(format!(
                        "block '{}' overlaps committed block '{}'",
                        block.id, other.id
                    )));
                }
            }
            for other in &blocks[..i] {
                if other.user_id == block.user_id && block.overlaps(other) {
                    return Err(StoreError::CommitRejected(format!(
                        "blocks '{}' and '{}' overlap within the batch",
                        other.id, block.id
                    )));
                }
            }
        }

        for block in blocks {
            self.bump(&block.user_id);
            self.blocks.insert(block.id.clone(), block.clone());
        }
        Ok(())
    }

    fn delete_blocks_for_task(&mut self, task_id: &TaskId) -> Result<usize, StoreError> {
        let doomed: Vec<BlockId> = self
            .blocks
            .values()
            .filter(|b| b.task_id == *task_id)
            .map(|b| b.id.clone())
            .collect();
        for id in &doomed {
            if let Some(block) = self.blocks.remove(id) {
                self.bump(&block.user_id);
            }
        }
        Ok(doomed.len())
    }

    fn version(&self, user: &UserId) -> Result<u64, StoreError> {
        Ok(self.versions.get(user).copied().unwrap_or(0))
    }
}

/// In-memory policy provider.
#[derive(Debug, Default)]
pub struct InMemoryPolicyProvider {
    policies: HashMap<UserId, WorkingHoursPolicy>,
}

impl InMemoryPolicyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, user: impl Into<UserId>, policy: WorkingHoursPolicy) {
        self.policies.insert(user.into(), policy);
    }
}

impl PolicyProvider for InMemoryPolicyProvider {
    fn working_hours_policy(&self, user: &UserId) -> Result<WorkingHoursPolicy, StoreError> {
        self.policies
            .get(user)
            .cloned()
            .ok_or_else(|| StoreError::PolicyNotFound(user.clone()))
    }
}
