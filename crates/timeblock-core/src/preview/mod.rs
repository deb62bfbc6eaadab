//! Preview/apply workflow around one scheduling run.
//!
//! A preview is a computed, not-yet-committed [`SchedulingResult`] the
//! caller can inspect, re-run, cancel, or apply. Apply is all-or-nothing and
//! guarded by an optimistic version check: if the committed schedule moved
//! since the preview snapshot, the whole apply fails as stale and the caller
//! retries the preview. At most one preview is active per workflow; starting
//! a new one implicitly cancels the old one.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::availability::{compute_availability, AvailabilityWindow};
use crate::conflict;
use crate::error::{PreviewError, Result, ValidationError};
use crate::prioritizer::order_tasks;
use crate::schedule::ScheduleBlock;
use crate::scheduler::{PlacementEngine, UnplacedTask};
use crate::store::{PolicyProvider, ScheduleStore, TaskStore};
use crate::task::{Task, TaskId, TaskStatus, UserId};

/// Outcome of one scheduling run, held until applied or discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingResult {
    /// Proposed blocks, not yet committed
    pub blocks: Vec<ScheduleBlock>,
    /// Tasks that found no feasible placement, with reasons
    pub unplaced: Vec<UnplacedTask>,
    /// Human-readable advisories for the caller
    pub suggestions: Vec<String>,
    /// True when every pending task was placed
    pub success: bool,
}

/// The preview currently held by the workflow.
struct ActivePreview {
    user: UserId,
    start_date: NaiveDate,
    end_date: NaiveDate,
    snapshot_version: u64,
    result: SchedulingResult,
}

/// Drives preview, apply, sweep, and manual placement over the store seams.
pub struct PreviewWorkflow<TS, SS, PP> {
    tasks: TS,
    schedule: SS,
    policies: PP,
    engine: PlacementEngine,
    active: Option<ActivePreview>,
}

impl<TS, SS, PP> PreviewWorkflow<TS, SS, PP>
where
    TS: TaskStore,
    SS: ScheduleStore,
    PP: PolicyProvider,
{
    /// Create a workflow with the default engine configuration.
    pub fn new(tasks: TS, schedule: SS, policies: PP) -> Self {
        Self::with_engine(tasks, schedule, policies, PlacementEngine::new())
    }

    /// Create a workflow around a configured engine.
    pub fn with_engine(tasks: TS, schedule: SS, policies: PP, engine: PlacementEngine) -> Self {
        Self {
            tasks,
            schedule,
            policies,
            engine,
            active: None,
        }
    }

    /// Compute a preview for the user's pending tasks over the date range.
    ///
    /// Reads one snapshot of tasks, blocks, and policy; any prior unapplied
    /// preview is discarded first. The result is held by the workflow until
    /// it is applied, retried, or cancelled.
    pub fn run_preview(
        &mut self,
        user: &UserId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<&SchedulingResult> {
        if self.active.take().is_some() {
            debug!(target: "timeblock::preview", user = %user, "discarding prior preview");
        }
        if start_date > end_date {
            return Err(ValidationError::InvalidDateRange {
                start: start_date,
                end: end_date,
            }
            .into());
        }

        let policy = self.policies.working_hours_policy(user)?;
        policy.validate()?;

        let pending = self.tasks.list_pending_tasks(user)?;
        let min_chunk = self.engine.config().min_chunk_minutes;
        for task in &pending {
            if (task.duration_minutes as i64) < min_chunk {
                return Err(ValidationError::DurationBelowMinimum {
                    task_id: task.id.clone(),
                    minutes: task.duration_minutes,
                    min_chunk,
                }
                .into());
            }
        }

        let (from, to) = listing_span(start_date, end_date);
        let existing = self.schedule.list_blocks(user, from, to)?;
        let snapshot_version = self.schedule.version(user)?;

        let windows = compute_availability(start_date, end_date, &policy, &existing)?;
        let ordered = order_tasks(&pending);
        let placement = self.engine.place(&ordered, &windows);

        let suggestions = build_suggestions(&ordered, &windows, &placement.unplaced);
        let success = placement.unplaced.is_empty();
        info!(
            target: "timeblock::preview",
            user = %user,
            blocks = placement.blocks.len(),
            unplaced = placement.unplaced.len(),
            "preview computed"
        );

        let active = self.active.insert(ActivePreview {
            user: user.clone(),
            start_date,
            end_date,
            snapshot_version,
            result: SchedulingResult {
                blocks: placement.blocks,
                unplaced: placement.unplaced,
                suggestions,
                success,
            },
        });
        Ok(&active.result)
    }

    /// Discard the active preview and recompute it with the same inputs.
    pub fn retry_preview(&mut self) -> Result<&SchedulingResult> {
        let (user, start_date, end_date) = self
            .active
            .as_ref()
            .map(|a| (a.user.clone(), a.start_date, a.end_date))
            .ok_or(PreviewError::NoActivePreview { action: "retry" })?;
        self.run_preview(&user, start_date, end_date)
    }

    /// Commit the active preview: persist its blocks and mark their tasks
    /// SCHEDULED, consuming any priority boosts.
    ///
    /// All-or-nothing for the batch. Fails as stale when the committed
    /// schedule version moved since the preview snapshot; the preview stays
    /// active so the caller can retry it.
    pub fn apply_preview(&mut self) -> Result<Vec<ScheduleBlock>> {
        let (user, snapshot_version, blocks) = self
            .active
            .as_ref()
            .map(|a| (a.user.clone(), a.snapshot_version, a.result.blocks.clone()))
            .ok_or(PreviewError::NoActivePreview { action: "apply" })?;

        let found = self.schedule.version(&user)?;
        if found != snapshot_version {
            warn!(
                target: "timeblock::preview",
                user = %user,
                expected = snapshot_version,
                found,
                "stale preview rejected"
            );
            return Err(PreviewError::Stale {
                expected: snapshot_version,
                found,
            }
            .into());
        }

        // validate every transition before committing anything
        let mut placed_ids = Vec::new();
        let mut seen = HashSet::new();
        for block in &blocks {
            if seen.insert(block.task_id.clone()) {
                placed_ids.push(block.task_id.clone());
            }
        }
        for id in &placed_ids {
            let mut task = self.tasks.get_task(id)?;
            task.transition_to(TaskStatus::Scheduled)?;
        }

        self.schedule.create_blocks(&blocks)?;
        for id in &placed_ids {
            self.tasks.update_task_status(id, TaskStatus::Scheduled)?;
            self.tasks.consume_priority_boost(id)?;
        }

        info!(
            target: "timeblock::preview",
            user = %user,
            blocks = blocks.len(),
            "preview applied"
        );
        self.active = None;
        Ok(blocks)
    }

    /// Discard the active preview, leaving tasks untouched. Returns whether
    /// there was one.
    pub fn cancel_preview(&mut self) -> bool {
        let had = self.active.take().is_some();
        if had {
            debug!(target: "timeblock::preview", "preview cancelled");
        }
        had
    }

    /// The currently held result, if any.
    pub fn active_preview(&self) -> Option<&SchedulingResult> {
        self.active.as_ref().map(|a| &a.result)
    }

    /// Move SCHEDULED tasks whose committed block ran past the grace period
    /// to MISSED, granting their re-entry priority boost. Returns the ids
    /// that moved.
    pub fn sweep_missed(&mut self, user: &UserId, now: DateTime<Utc>) -> Result<Vec<TaskId>> {
        let blocks = self
            .schedule
            .list_blocks(user, DateTime::<Utc>::MIN_UTC, now)?;

        let mut tasks = Vec::new();
        let mut seen = HashSet::new();
        for block in &blocks {
            if seen.insert(block.task_id.clone()) {
                // blocks may outlive their task; skip orphans
                if let Ok(task) = self.tasks.get_task(&block.task_id) {
                    tasks.push(task);
                }
            }
        }

        let overdue = self.engine.overdue_task_ids(now, &blocks, &tasks);
        for id in &overdue {
            let mut task = self.tasks.get_task(id)?;
            task.transition_to(TaskStatus::Missed)?;
            self.tasks.update_task_status(id, TaskStatus::Missed)?;
        }
        if !overdue.is_empty() {
            debug!(
                target: "timeblock::sweep",
                user = %user,
                missed = overdue.len(),
                "sweep moved tasks to MISSED"
            );
        }
        Ok(overdue)
    }

    /// Place one task at an explicit start time, immediately committed.
    ///
    /// Validated by the same overlap predicate as automatic placement, but
    /// allowed to land outside working hours -- an explicit caller choice.
    pub fn place_manual(
        &mut self,
        task_id: &TaskId,
        start: DateTime<Utc>,
    ) -> Result<ScheduleBlock> {
        let mut task = self.tasks.get_task(task_id)?;
        let min_chunk = self.engine.config().min_chunk_minutes;
        if (task.duration_minutes as i64) < min_chunk {
            return Err(ValidationError::DurationBelowMinimum {
                task_id: task.id.clone(),
                minutes: task.duration_minutes,
                min_chunk,
            }
            .into());
        }

        let end = start + Duration::minutes(task.duration_minutes as i64);
        let existing =
            self.schedule
                .list_blocks(&task.user_id, start - Duration::days(1), end + Duration::days(1))?;
        if let Some(other) = existing
            .iter()
            .find(|b| conflict::overlaps(start, end, b.start_time, b.end_time))
        {
            warn!(
                target: "timeblock::manual",
                task = %task.id,
                block = %other.id,
                "manual placement conflicts with a committed block"
            );
            return Err(ValidationError::PlacementConflict {
                task_id: task.id.clone(),
                block_id: other.id.clone(),
            }
            .into());
        }

        task.transition_to(TaskStatus::Scheduled)?;
        let block = ScheduleBlock::new(task.id.clone(), task.user_id.clone(), start, end);
        self.schedule.create_blocks(std::slice::from_ref(&block))?;
        self.tasks.update_task_status(task_id, TaskStatus::Scheduled)?;
        self.tasks.consume_priority_boost(task_id)?;
        Ok(block)
    }

    pub fn task_store(&self) -> &TS {
        &self.tasks
    }

    pub fn task_store_mut(&mut self) -> &mut TS {
        &mut self.tasks
    }

    pub fn schedule_store(&self) -> &SS {
        &self.schedule
    }

    pub fn schedule_store_mut(&mut self) -> &mut SS {
        &mut self.schedule
    }
}

/// UTC span used to fetch committed blocks for a date range, padded a day on
/// each side to cover any timezone offset.
fn listing_span(start_date: NaiveDate, end_date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = (start_date - Duration::days(1)).and_time(NaiveTime::MIN);
    let to = (end_date + Duration::days(2)).and_time(NaiveTime::MIN);
    (Utc.from_utc_datetime(&from), Utc.from_utc_datetime(&to))
}

fn build_suggestions(
    tasks: &[Task],
    windows: &[AvailabilityWindow],
    unplaced: &[UnplacedTask],
) -> Vec<String> {
    let mut suggestions = Vec::new();

    let total_needed: i64 = tasks.iter().map(|t| t.duration_minutes as i64).sum();
    let total_free: i64 = windows.iter().map(|w| w.duration_minutes()).sum();
    if total_needed > total_free {
        suggestions.push(format!(
            "Pending tasks need {} min but only {} min are free in the selected range; \
             consider widening the range or deferring some tasks.",
            total_needed, total_free
        ));
    }

    for entry in unplaced {
        suggestions.push(format!(
            "Task '{}' could not be placed: {}.",
            entry.task.title,
            entry.reason.message()
        ));
    }

    suggestions
}
