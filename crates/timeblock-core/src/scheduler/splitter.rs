//! Greedy task splitting across availability windows.
//!
//! Carves a task that cannot fit in any single window into ordered
//! sub-blocks, consuming windows chronologically until the cumulative carved
//! duration equals the task's total duration. Every sub-block stays at or
//! above the minimum viable chunk: when filling a window would leave a
//! residual smaller than the minimum, the carve is reduced so the tail keeps
//! a viable size instead of producing a fragment.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use super::SchedulerConfig;
use crate::availability::AvailabilityWindow;
use crate::schedule::{ScheduleBlock, SplitReason};
use crate::task::Task;

/// Outcome of a successful split.
#[derive(Debug, Clone)]
pub struct SplitPlacement {
    /// Ordered sub-blocks covering the full task duration
    pub blocks: Vec<ScheduleBlock>,
    /// Windows left after the carve, shrunk and pruned
    pub remaining: Vec<AvailabilityWindow>,
    /// Minutes carved per calendar day
    pub minutes_per_day: BTreeMap<NaiveDate, i64>,
}

/// Split `task` across `windows`, or return `None` when the reachable
/// capacity cannot cover the full duration.
///
/// # Arguments
/// * `windows` - free windows in chronological order
/// * `day_load` - minutes already placed per day in this run, counted
///   against `max_minutes_per_day` when that cap is configured
///
/// Sub-blocks never end after the task's deadline; window capacity past the
/// deadline is simply unreachable for this task.
pub fn split(
    task: &Task,
    windows: &[AvailabilityWindow],
    config: &SchedulerConfig,
    day_load: &BTreeMap<NaiveDate, i64>,
) -> Option<SplitPlacement> {
    let needed = task.duration_minutes as i64;
    let min_chunk = config.min_chunk_minutes;
    let buffer = config.buffer_minutes.max(0);

    let mut remaining_need = needed;
    let mut out_windows = windows.to_vec();
    let mut carved: Vec<(NaiveDate, chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>)> =
        Vec::new();
    let mut minutes_per_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();

    for idx in 0..out_windows.len() {
        if remaining_need == 0 {
            break;
        }

        let window = out_windows[idx].clone();
        let mut cap = window.duration_minutes();

        if let Some(limit) = config.max_minutes_per_day {
            let used = day_load.get(&window.date).copied().unwrap_or(0)
                + minutes_per_day.get(&window.date).copied().unwrap_or(0);
            cap = cap.min(limit - used);
        }
        if let Some(deadline) = task.deadline {
            cap = cap.min((deadline - window.start).num_minutes());
        }
        if cap < min_chunk {
            continue;
        }

        let mut slice = cap.min(remaining_need);
        let residual = remaining_need - slice;
        if residual > 0 && residual < min_chunk {
            // keep the tail viable instead of leaving a fragment
            slice = remaining_need - min_chunk;
            if slice < min_chunk {
                continue;
            }
        }

        let start = window.start;
        let end = start + Duration::minutes(slice);
        carved.push((window.date, start, end));
        *minutes_per_day.entry(window.date).or_insert(0) += slice;
        remaining_need -= slice;

        out_windows[idx].start = end + Duration::minutes(buffer);
    }

    if remaining_need > 0 {
        return None;
    }

    out_windows.retain(|w| w.start < w.end);

    let total = carved.len() as u32;
    let blocks = carved
        .into_iter()
        .enumerate()
        .map(|(i, (_, start, end))| {
            let block = ScheduleBlock::new(task.id.clone(), task.user_id.clone(), start, end);
            if total > 1 {
                block.with_split(i as u32 + 1, total, SplitReason::AutoSplit)
            } else {
                // degenerate single carve (deadline-clamped window), not a split
                block
            }
        })
        .collect();

    Some(SplitPlacement {
        blocks,
        remaining: out_windows,
        minutes_per_day,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn window(day: u32, start_h: u32, start_m: u32, minutes: i64) -> AvailabilityWindow {
        let start = Utc
            .with_ymd_and_hms(2026, 3, day, start_h, start_m, 0)
            .unwrap();
        AvailabilityWindow {
            date: start.date_naive(),
            start,
            end: start + Duration::minutes(minutes),
            working: true,
        }
    }

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, minute, 0).unwrap()
    }

    fn task(minutes: u32) -> Task {
        Task::new("u-1", "Long task", minutes)
    }

    #[test]
    fn splits_across_two_windows_with_full_coverage() {
        let windows = vec![window(2, 10, 0, 150), window(2, 14, 0, 150)];
        let placement = split(
            &task(300),
            &windows,
            &SchedulerConfig::default(),
            &BTreeMap::new(),
        )
        .unwrap();

        assert_eq!(placement.blocks.len(), 2);
        let total: i64 = placement.blocks.iter().map(|b| b.duration_minutes()).sum();
        assert_eq!(total, 300);

        let first = placement.blocks[0].split.unwrap();
        let second = placement.blocks[1].split.unwrap();
        assert_eq!((first.part, first.total), (1, 2));
        assert_eq!((second.part, second.total), (2, 2));
        assert_eq!(first.reason, SplitReason::AutoSplit);
        assert!(placement.remaining.is_empty());
    }

    #[test]
    fn rebalances_to_avoid_a_fragment_tail() {
        // 200 needed over a 180-min window: a full carve would leave a
        // 20-min fragment, so the first carve shrinks to 170 + 30.
        let windows = vec![window(2, 10, 0, 180), window(3, 10, 0, 120)];
        let placement = split(
            &task(200),
            &windows,
            &SchedulerConfig::default(),
            &BTreeMap::new(),
        )
        .unwrap();

        let durations: Vec<i64> = placement
            .blocks
            .iter()
            .map(|b| b.duration_minutes())
            .collect();
        assert_eq!(durations, vec![170, 30]);
        assert!(durations.iter().all(|d| *d >= 30));
    }

    #[test]
    fn skips_windows_below_the_minimum_chunk() {
        let windows = vec![window(2, 10, 0, 20), window(2, 12, 0, 300)];
        let placement = split(
            &task(300),
            &windows,
            &SchedulerConfig::default(),
            &BTreeMap::new(),
        )
        .unwrap();
        // the 20-min window cannot host a viable chunk
        assert_eq!(placement.blocks.len(), 1);
        assert_eq!(placement.blocks[0].start_time, at(2, 12, 0));
        assert!(placement.blocks[0].split.is_none());
    }

    #[test]
    fn fails_when_capacity_is_insufficient() {
        let windows = vec![window(2, 10, 0, 120), window(3, 10, 0, 120)];
        assert!(split(
            &task(300),
            &windows,
            &SchedulerConfig::default(),
            &BTreeMap::new(),
        )
        .is_none());
    }

    #[test]
    fn deadline_clamps_reachable_capacity() {
        let windows = vec![window(2, 10, 0, 240), window(3, 10, 0, 240)];
        let mut long = task(300);
        // Only the first day is usable before the deadline
        long.deadline = Some(at(2, 23, 0));
        assert!(split(&long, &windows, &SchedulerConfig::default(), &BTreeMap::new()).is_none());

        long.deadline = Some(at(3, 23, 0));
        let placement =
            split(&long, &windows, &SchedulerConfig::default(), &BTreeMap::new()).unwrap();
        assert_eq!(placement.blocks.len(), 2);
        for block in &placement.blocks {
            assert!(block.end_time <= long.deadline.unwrap());
        }
    }

    #[test]
    fn daily_cap_limits_the_carve_per_day() {
        let windows = vec![window(2, 10, 0, 300), window(3, 10, 0, 300)];
        let config = SchedulerConfig {
            max_minutes_per_day: Some(180),
            ..SchedulerConfig::default()
        };
        let placement = split(&task(300), &windows, &config, &BTreeMap::new()).unwrap();
        assert_eq!(placement.blocks.len(), 2);
        assert_eq!(placement.blocks[0].duration_minutes(), 180);
        assert_eq!(placement.blocks[1].duration_minutes(), 120);
        assert_eq!(
            placement
                .minutes_per_day
                .get(&at(2, 0, 0).date_naive())
                .copied(),
            Some(180)
        );
    }
}
