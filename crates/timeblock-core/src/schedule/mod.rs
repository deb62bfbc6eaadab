//! Schedule blocks and working-hours policies.
//!
//! All instants are UTC. A policy holds local wall-clock bounds plus an IANA
//! timezone and is resolved to UTC per day; DST gaps drop the affected day
//! bound, ambiguous local times take the earlier mapping.

use chrono::{DateTime, Datelike, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::conflict;
use crate::error::ValidationError;
use crate::task::{TaskId, UserId};

/// Unique identifier for a schedule block.
pub type BlockId = String;

/// Why a block is a fragment of a larger task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplitReason {
    /// Produced by the automatic splitter
    AutoSplit,
    /// Split manually by the user (outside this core)
    UserSplit,
    /// Split to resolve a conflict during manual editing (outside this core)
    TimeConflict,
}

impl SplitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitReason::AutoSplit => "auto-split",
            SplitReason::UserSplit => "user-split",
            SplitReason::TimeConflict => "time-conflict",
        }
    }
}

/// Split descriptor carried by a fragment block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitMeta {
    /// 1-based part number
    pub part: u32,
    /// Total number of parts
    pub total: u32,
    /// Why the task was split
    pub reason: SplitReason,
}

/// A placed span of time for one task (or one fragment of a split task).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleBlock {
    /// Unique identifier
    pub id: BlockId,
    /// Task this block places
    pub task_id: TaskId,
    /// Owning user
    pub user_id: UserId,
    /// Start instant (inclusive)
    pub start_time: DateTime<Utc>,
    /// End instant (exclusive), strictly after the start
    pub end_time: DateTime<Utc>,
    /// Present when this block is a fragment of a split task
    pub split: Option<SplitMeta>,
    /// Whether the work in this block has been completed
    #[serde(default)]
    pub completed: bool,
}

impl ScheduleBlock {
    /// Create a new block.
    ///
    /// # Panics
    /// Panics if `end_time <= start_time`. Use [`try_new`](Self::try_new)
    /// for a non-panicking version.
    pub fn new(
        task_id: impl Into<TaskId>,
        user_id: impl Into<UserId>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self::try_new(task_id, user_id, start_time, end_time)
            .expect("ScheduleBlock::new: end_time must be greater than start_time")
    }

    /// Create a new block, returning a Result.
    ///
    /// # Errors
    /// Returns an error if `end_time <= start_time`.
    pub fn try_new(
        task_id: impl Into<TaskId>,
        user_id: impl Into<UserId>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if end_time <= start_time {
            return Err(ValidationError::InvalidTimeRange {
                start: start_time,
                end: end_time,
            });
        }
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            task_id: task_id.into(),
            user_id: user_id.into(),
            start_time,
            end_time,
            split: None,
            completed: false,
        })
    }

    /// Tag this block as a split fragment.
    pub fn with_split(mut self, part: u32, total: u32, reason: SplitReason) -> Self {
        self.split = Some(SplitMeta {
            part,
            total,
            reason,
        });
        self
    }

    /// Get duration in minutes
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    /// Check if this block overlaps with another.
    pub fn overlaps(&self, other: &ScheduleBlock) -> bool {
        conflict::overlaps(
            self.start_time,
            self.end_time,
            other.start_time,
            other.end_time,
        )
    }
}

/// Per-user working hours: local wall-clock bounds, timezone, and the set of
/// workable weekdays (0 = Monday through 6 = Sunday).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingHoursPolicy {
    /// Local start of the working day
    pub start: NaiveTime,
    /// Local end of the working day
    pub end: NaiveTime,
    /// IANA timezone the wall-clock bounds are expressed in
    pub timezone: Tz,
    /// Workable weekdays, 0 = Monday through 6 = Sunday
    pub workdays: Vec<u8>,
}

impl WorkingHoursPolicy {
    /// Create a policy with a Monday-through-Friday work week.
    pub fn new(start: NaiveTime, end: NaiveTime, timezone: Tz) -> Self {
        Self {
            start,
            end,
            timezone,
            workdays: vec![0, 1, 2, 3, 4],
        }
    }

    /// Set the workable weekdays (0 = Monday through 6 = Sunday).
    pub fn with_workdays(mut self, workdays: Vec<u8>) -> Self {
        self.workdays = workdays;
        self
    }

    /// Reject a policy whose daily span is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.start >= self.end {
            return Err(ValidationError::EmptyWorkingHours {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// Whether `date` falls on a workable weekday.
    pub fn is_workday(&self, date: NaiveDate) -> bool {
        let weekday = date.weekday().num_days_from_monday() as u8;
        self.workdays.contains(&weekday)
    }

    /// UTC bounds of the working span on `date`, or `None` when the day is
    /// not workable, the span is empty, or a DST gap swallows a bound.
    pub fn day_bounds(&self, date: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        if !self.is_workday(date) || self.start >= self.end {
            return None;
        }
        let start = self.resolve_local(date.and_time(self.start))?;
        let end = self.resolve_local(date.and_time(self.end))?;
        (start < end).then_some((start, end))
    }

    /// Resolve a local wall-clock time to a UTC instant.
    ///
    /// Ambiguous times (clocks rolled back) take the earlier mapping; times
    /// inside a DST gap resolve to `None`.
    fn resolve_local(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self.timezone.from_local_datetime(&naive) {
            LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(first, _) => Some(first.with_timezone(&Utc)),
            LocalResult::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn policy(start_h: u32, end_h: u32) -> WorkingHoursPolicy {
        WorkingHoursPolicy::new(
            NaiveTime::from_hms_opt(start_h, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(end_h, 0, 0).unwrap(),
            chrono_tz::UTC,
        )
    }

    #[test]
    fn block_rejects_empty_range() {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        assert!(ScheduleBlock::try_new("t-1", "u-1", start, start).is_err());
        assert!(ScheduleBlock::try_new("t-1", "u-1", start, start - Duration::minutes(30)).is_err());
    }

    #[test]
    fn block_duration_and_overlap() {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let a = ScheduleBlock::new("t-1", "u-1", start, start + Duration::minutes(90));
        let b = ScheduleBlock::new(
            "t-2",
            "u-1",
            start + Duration::minutes(90),
            start + Duration::minutes(120),
        );
        assert_eq!(a.duration_minutes(), 90);
        // back-to-back blocks do not overlap
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn split_reason_serializes_kebab_case() {
        let json = serde_json::to_string(&SplitReason::AutoSplit).unwrap();
        assert_eq!(json, "\"auto-split\"");
        assert_eq!(SplitReason::TimeConflict.as_str(), "time-conflict");
    }

    #[test]
    fn policy_day_bounds_on_a_workday() {
        let p = policy(10, 20);
        // 2026-03-02 is a Monday
        let (start, end) = p
            .day_bounds(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap())
            .unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 3, 2, 20, 0, 0).unwrap());
    }

    #[test]
    fn policy_skips_non_workdays() {
        let p = policy(10, 20);
        // 2026-03-07 is a Saturday
        assert!(p
            .day_bounds(NaiveDate::from_ymd_opt(2026, 3, 7).unwrap())
            .is_none());
        let seven_day = p.clone().with_workdays(vec![0, 1, 2, 3, 4, 5, 6]);
        assert!(seven_day
            .day_bounds(NaiveDate::from_ymd_opt(2026, 3, 7).unwrap())
            .is_some());
    }

    #[test]
    fn empty_span_contributes_no_bounds_and_fails_validation() {
        let p = policy(20, 10);
        assert!(p.validate().is_err());
        assert!(p
            .day_bounds(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap())
            .is_none());
    }

    #[test]
    fn policy_resolves_through_its_timezone() {
        let p = WorkingHoursPolicy::new(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            chrono_tz::America::New_York,
        );
        // 2026-01-05 is a Monday; New York is UTC-5 in January
        let (start, _) = p
            .day_bounds(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap())
            .unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 1, 5, 14, 0, 0).unwrap());
    }
}
