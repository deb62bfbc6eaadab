//! Interval overlap detection.
//!
//! The single predicate shared by availability computation and placement
//! validation. Intervals are half-open: adjacent intervals (where one ends
//! exactly when another starts) are NOT conflicts.

use chrono::{DateTime, Utc};

/// Check whether two half-open intervals overlap.
///
/// Two intervals overlap iff `start_a < end_b && start_b < end_a`.
/// Touching endpoints do not count as overlap.
pub fn overlaps(
    start_a: DateTime<Utc>,
    end_a: DateTime<Utc>,
    start_b: DateTime<Utc>,
    end_b: DateTime<Utc>,
) -> bool {
    start_a < end_b && start_b < end_a
}

/// Overlap duration in minutes, zero when the intervals do not overlap.
pub fn overlap_minutes(
    start_a: DateTime<Utc>,
    end_a: DateTime<Utc>,
    start_b: DateTime<Utc>,
    end_b: DateTime<Utc>,
) -> i64 {
    if !overlaps(start_a, end_a, start_b, end_b) {
        return 0;
    }
    let overlap_start = start_a.max(start_b);
    let overlap_end = end_a.min(end_b);
    (overlap_end - overlap_start).num_minutes()
}
