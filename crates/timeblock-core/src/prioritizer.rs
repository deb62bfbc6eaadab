//! Deterministic placement ordering for pending tasks.
//!
//! Sort key, in order: effective priority rank (URGENT first, including the
//! one-time boost a missed task carries back in), deadline (earlier first,
//! any deadline before none), recency (most-recently-created first), then id
//! so the order is a total one.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::task::Task;

/// Order tasks into their placement sequence.
pub fn order_tasks(tasks: &[Task]) -> Vec<Task> {
    let mut ordered = tasks.to_vec();
    ordered.sort_by(compare_tasks);
    ordered
}

/// The total order used by [`order_tasks`].
pub fn compare_tasks(a: &Task, b: &Task) -> Ordering {
    a.effective_priority()
        .rank()
        .cmp(&b.effective_priority().rank())
        .then_with(|| compare_deadlines(a.deadline, b.deadline))
        // most-recently-created first
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

fn compare_deadlines(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
