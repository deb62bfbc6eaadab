//! Automatic placement of prioritized tasks into availability windows.
//!
//! This module provides the placement engine:
//! - First-fit scan over chronological windows, shrinking each window as it
//!   is consumed
//! - Deadline feasibility checks before a placement is accepted
//! - Delegation to the splitter for tasks above the auto-split threshold
//! - Per-task conflict reasons for everything that cannot be placed
//!
//! The engine is synchronous and deterministic: it takes its whole working
//! set as input and returns a value, touching no shared state.

pub mod splitter;

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::availability::AvailabilityWindow;
use crate::schedule::ScheduleBlock;
use crate::task::{Task, TaskCategory, TaskId, TaskStatus};

pub use splitter::{split, SplitPlacement};

/// Scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Minimum viable chunk for any placement or split fragment (minutes)
    pub min_chunk_minutes: i64,
    /// Duration above which an unplaceable task is split instead (minutes)
    pub auto_split_threshold_minutes: i64,
    /// Grace period after a block's end before it counts as missed (minutes)
    pub missed_grace_minutes: i64,
    /// Idle spacing consumed from a window after each placement (minutes)
    pub buffer_minutes: i64,
    /// Optional cap on newly placed minutes per calendar day
    pub max_minutes_per_day: Option<i64>,
    /// Prefer placing a task right after an earlier block of its category
    pub prefer_category_grouping: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_chunk_minutes: 30,
            auto_split_threshold_minutes: 240,
            missed_grace_minutes: 30,
            buffer_minutes: 0,
            max_minutes_per_day: None,
            prefer_category_grouping: false,
        }
    }
}

/// Why a task could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictReason {
    /// Not enough free time in the planning range
    NoCapacity,
    /// Every feasible placement would end after the task's deadline
    DeadlineUnreachable,
}

impl ConflictReason {
    pub fn message(&self) -> &'static str {
        match self {
            ConflictReason::NoCapacity => "no remaining capacity in the planning range",
            ConflictReason::DeadlineUnreachable => {
                "the earliest feasible placement would end after the deadline"
            }
        }
    }
}

/// A task the engine could not place, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnplacedTask {
    pub task: Task,
    pub reason: ConflictReason,
}

/// Outcome of one placement run.
#[derive(Debug, Clone)]
pub struct PlacementResult {
    /// Proposed blocks, in placement order
    pub blocks: Vec<ScheduleBlock>,
    /// Tasks that found no feasible placement; they stay WAITING
    pub unplaced: Vec<UnplacedTask>,
    /// Availability left over after the run
    pub remaining: Vec<AvailabilityWindow>,
}

/// How a window scan ended.
enum WindowSearch {
    Found(usize),
    NotFound { fits_ignoring_deadline: bool },
}

/// Automatic placement engine.
pub struct PlacementEngine {
    config: SchedulerConfig,
}

impl PlacementEngine {
    /// Create a new engine with default config
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
        }
    }

    /// Create with custom config
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Place tasks, in the order given, into the windows.
    ///
    /// # Arguments
    /// * `ordered_tasks` - tasks in placement order (see the prioritizer)
    /// * `windows` - free windows; they are copied and consumed locally
    ///
    /// # Returns
    /// Proposed blocks, unplaced tasks with reasons, and the availability
    /// left over.
    pub fn place(
        &self,
        ordered_tasks: &[Task],
        windows: &[AvailabilityWindow],
    ) -> PlacementResult {
        let buffer = self.config.buffer_minutes.max(0);

        let mut remaining: Vec<AvailabilityWindow> = windows
            .iter()
            .filter(|w| w.duration_minutes() > 0)
            .cloned()
            .collect();
        remaining.sort_by_key(|w| w.start);

        let mut blocks = Vec::new();
        let mut unplaced = Vec::new();
        let mut day_load: BTreeMap<NaiveDate, i64> = BTreeMap::new();
        let mut category_cursor: HashMap<TaskCategory, DateTime<Utc>> = HashMap::new();

        for task in ordered_tasks {
            let duration = task.duration_minutes as i64;

            match self.find_window(task, duration, &remaining, &day_load, &category_cursor) {
                WindowSearch::Found(idx) => {
                    let start = remaining[idx].start;
                    let end = start + Duration::minutes(duration);
                    let date = remaining[idx].date;

                    blocks.push(ScheduleBlock::new(
                        task.id.clone(),
                        task.user_id.clone(),
                        start,
                        end,
                    ));

                    remaining[idx].start = end + Duration::minutes(buffer);
                    if remaining[idx].start >= remaining[idx].end {
                        remaining.remove(idx);
                    }
                    *day_load.entry(date).or_insert(0) += duration;
                    category_cursor.insert(task.category, end + Duration::minutes(buffer));
                }
                WindowSearch::NotFound {
                    fits_ignoring_deadline,
                } => {
                    let total_free: i64 = remaining.iter().map(|w| w.duration_minutes()).sum();
                    let splittable = duration > self.config.auto_split_threshold_minutes
                        && total_free >= duration;

                    if splittable {
                        if let Some(placement) =
                            splitter::split(task, &remaining, &self.config, &day_load)
                        {
                            for (date, minutes) in &placement.minutes_per_day {
                                *day_load.entry(*date).or_insert(0) += minutes;
                            }
                            if let Some(last) = placement.blocks.last() {
                                category_cursor.insert(
                                    task.category,
                                    last.end_time + Duration::minutes(buffer),
                                );
                            }
                            blocks.extend(placement.blocks);
                            remaining = placement.remaining;
                            continue;
                        }

                        // the split failed; if it only failed because of the
                        // deadline, report that instead of raw capacity
                        let reason = if task.deadline.is_some()
                            && self.would_split_without_deadline(task, &remaining, &day_load)
                        {
                            ConflictReason::DeadlineUnreachable
                        } else {
                            ConflictReason::NoCapacity
                        };
                        unplaced.push(UnplacedTask {
                            task: task.clone(),
                            reason,
                        });
                    } else {
                        let reason = if fits_ignoring_deadline && task.deadline.is_some() {
                            ConflictReason::DeadlineUnreachable
                        } else {
                            ConflictReason::NoCapacity
                        };
                        unplaced.push(UnplacedTask {
                            task: task.clone(),
                            reason,
                        });
                    }
                }
            }
        }

        PlacementResult {
            blocks,
            unplaced,
            remaining,
        }
    }

    /// Tasks whose committed block ran past the grace period uncompleted.
    ///
    /// Returns the ids of SCHEDULED tasks that should move to MISSED; the
    /// caller applies the transitions. Polling cadence is the host's choice.
    pub fn overdue_task_ids(
        &self,
        now: DateTime<Utc>,
        blocks: &[ScheduleBlock],
        tasks: &[Task],
    ) -> Vec<TaskId> {
        let grace = Duration::minutes(self.config.missed_grace_minutes);
        let scheduled: HashSet<&TaskId> = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Scheduled)
            .map(|t| &t.id)
            .collect();

        let mut seen = HashSet::new();
        let mut overdue = Vec::new();
        for block in blocks {
            if block.completed || block.end_time + grace >= now {
                continue;
            }
            if scheduled.contains(&block.task_id) && seen.insert(block.task_id.clone()) {
                overdue.push(block.task_id.clone());
            }
        }
        overdue
    }

    /// First window that can host the whole task, honoring the deadline, the
    /// daily cap, and (when enabled) category adjacency.
    fn find_window(
        &self,
        task: &Task,
        duration: i64,
        windows: &[AvailabilityWindow],
        day_load: &BTreeMap<NaiveDate, i64>,
        category_cursor: &HashMap<TaskCategory, DateTime<Utc>>,
    ) -> WindowSearch {
        if self.config.prefer_category_grouping {
            if let Some(cursor) = category_cursor.get(&task.category) {
                let adjacent = windows.iter().position(|w| {
                    w.start == *cursor && self.window_accepts(task, duration, w, day_load)
                });
                if let Some(idx) = adjacent {
                    return WindowSearch::Found(idx);
                }
            }
        }

        let mut fits_ignoring_deadline = false;
        for (idx, window) in windows.iter().enumerate() {
            if !self.window_has_room(duration, window, day_load) {
                continue;
            }
            if let Some(deadline) = task.deadline {
                if window.start + Duration::minutes(duration) > deadline {
                    fits_ignoring_deadline = true;
                    continue;
                }
            }
            return WindowSearch::Found(idx);
        }

        WindowSearch::NotFound {
            fits_ignoring_deadline,
        }
    }

    fn window_accepts(
        &self,
        task: &Task,
        duration: i64,
        window: &AvailabilityWindow,
        day_load: &BTreeMap<NaiveDate, i64>,
    ) -> bool {
        if !self.window_has_room(duration, window, day_load) {
            return false;
        }
        match task.deadline {
            Some(deadline) => window.start + Duration::minutes(duration) <= deadline,
            None => true,
        }
    }

    fn window_has_room(
        &self,
        duration: i64,
        window: &AvailabilityWindow,
        day_load: &BTreeMap<NaiveDate, i64>,
    ) -> bool {
        if !window.can_fit(duration) {
            return false;
        }
        match self.config.max_minutes_per_day {
            Some(limit) => {
                let used = day_load.get(&window.date).copied().unwrap_or(0);
                limit - used >= duration
            }
            None => true,
        }
    }

    fn would_split_without_deadline(
        &self,
        task: &Task,
        windows: &[AvailabilityWindow],
        day_load: &BTreeMap<NaiveDate, i64>,
    ) -> bool {
        let mut unconstrained = task.clone();
        unconstrained.deadline = None;
        splitter::split(&unconstrained, windows, &self.config, day_load).is_some()
    }
}

impl Default for PlacementEngine {
    fn default() -> Self {
        Self::new()
    }
}
