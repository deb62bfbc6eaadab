//! CLI commands and the plan-file format they share.

pub mod plan;
pub mod sweep;

use std::path::Path;

use serde::{Deserialize, Serialize};
use timeblock_core::{
    InMemoryPolicyProvider, InMemoryScheduleStore, InMemoryTaskStore, PreviewWorkflow,
    ScheduleBlock, Task, UserId, WorkingHoursPolicy,
};

/// The CLI's working set: one user's tasks, committed blocks, and policy,
/// loaded into the in-memory stores for a run and written back afterwards.
#[derive(Debug, Serialize, Deserialize)]
pub struct PlanFile {
    pub user: UserId,
    pub policy: WorkingHoursPolicy,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub blocks: Vec<ScheduleBlock>,
}

impl PlanFile {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Build a preview workflow over this plan's contents.
    pub fn into_workflow(
        self,
        engine: timeblock_core::PlacementEngine,
    ) -> (
        UserId,
        PreviewWorkflow<InMemoryTaskStore, InMemoryScheduleStore, InMemoryPolicyProvider>,
    ) {
        let mut tasks = InMemoryTaskStore::new();
        for task in self.tasks {
            tasks.insert(task);
        }
        let mut blocks = InMemoryScheduleStore::new();
        for block in self.blocks {
            blocks.insert(block);
        }
        let mut policies = InMemoryPolicyProvider::new();
        policies.insert(self.user.clone(), self.policy);
        (
            self.user,
            PreviewWorkflow::with_engine(tasks, blocks, policies, engine),
        )
    }

    /// Rebuild a plan file from the workflow's stores after mutations.
    pub fn from_workflow(
        user: UserId,
        policy: WorkingHoursPolicy,
        workflow: &PreviewWorkflow<InMemoryTaskStore, InMemoryScheduleStore, InMemoryPolicyProvider>,
    ) -> Self {
        let mut tasks: Vec<Task> = workflow.task_store().tasks().cloned().collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        let mut blocks: Vec<ScheduleBlock> =
            workflow.schedule_store().blocks().cloned().collect();
        blocks.sort_by_key(|b| b.start_time);
        Self {
            user,
            policy,
            tasks,
            blocks,
        }
    }
}
