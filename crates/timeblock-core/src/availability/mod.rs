//! Free-window computation for a user across a date range.
//!
//! Each day in range is partitioned into fixed-size slots inside the
//! working-hours policy; slots overlapping a committed block are excluded,
//! and adjacent free slots coalesce into maximal contiguous windows. Pure
//! function of its inputs -- safe to recompute and discard on every run.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::conflict;
use crate::error::ValidationError;
use crate::schedule::{ScheduleBlock, WorkingHoursPolicy};

/// Canonical slot granularity in minutes.
pub const SLOT_MINUTES: i64 = 30;

/// A contiguous stretch of free time on one calendar day.
///
/// Windows are ephemeral: the placement engine consumes them by producing a
/// reduced set, never by mutating a caller-held window in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    /// Policy-local calendar day the window belongs to
    pub date: NaiveDate,
    /// Start instant (inclusive)
    pub start: DateTime<Utc>,
    /// End instant (exclusive)
    pub end: DateTime<Utc>,
    /// Whether the window lies inside the working-hours policy. Windows a
    /// caller appends by hand (explicitly allowed off-hours time) carry
    /// `false`.
    pub working: bool,
}

impl AvailabilityWindow {
    /// Get duration in minutes
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Check if this window can fit a task of the given duration.
    pub fn can_fit(&self, minutes: i64) -> bool {
        self.duration_minutes() >= minutes
    }
}

/// Compute the free windows between `start_date` and `end_date` (inclusive).
///
/// # Arguments
/// * `start_date` / `end_date` - planning range, policy-local dates
/// * `policy` - the user's working hours
/// * `existing` - committed blocks for the same user over the range
///
/// # Returns
/// Maximal free windows in chronological order. Days whose weekday is not
/// workable, or whose policy span is empty, contribute no windows.
pub fn compute_availability(
    start_date: NaiveDate,
    end_date: NaiveDate,
    policy: &WorkingHoursPolicy,
    existing: &[ScheduleBlock],
) -> Result<Vec<AvailabilityWindow>, ValidationError> {
    if start_date > end_date {
        return Err(ValidationError::InvalidDateRange {
            start: start_date,
            end: end_date,
        });
    }

    let mut windows = Vec::new();
    let mut date = start_date;
    loop {
        if let Some((day_start, day_end)) = policy.day_bounds(date) {
            collect_day_windows(date, day_start, day_end, existing, &mut windows);
        }
        if date >= end_date {
            break;
        }
        let Some(next) = date.succ_opt() else { break };
        date = next;
    }

    Ok(windows)
}

/// Sweep one day's slots, coalescing free runs into maximal windows.
fn collect_day_windows(
    date: NaiveDate,
    day_start: DateTime<Utc>,
    day_end: DateTime<Utc>,
    existing: &[ScheduleBlock],
    windows: &mut Vec<AvailabilityWindow>,
) {
    let mut current: Option<(DateTime<Utc>, DateTime<Utc>)> = None;
    let mut slot_start = day_start;

    while slot_start < day_end {
        let slot_end = (slot_start + Duration::minutes(SLOT_MINUTES)).min(day_end);
        let busy = existing
            .iter()
            .any(|b| conflict::overlaps(slot_start, slot_end, b.start_time, b.end_time));

        if busy {
            if let Some((start, end)) = current.take() {
                windows.push(AvailabilityWindow {
                    date,
                    start,
                    end,
                    working: true,
                });
            }
        } else {
            current = Some(match current {
                Some((start, _)) => (start, slot_end),
                None => (slot_start, slot_end),
            });
        }

        slot_start = slot_end;
    }

    if let Some((start, end)) = current {
        windows.push(AvailabilityWindow {
            date,
            start,
            end,
            working: true,
        });
    }
}
