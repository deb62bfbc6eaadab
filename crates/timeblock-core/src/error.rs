//! Core error types for timeblock-core.
//!
//! Infeasible placements are never errors -- they travel as data inside a
//! [`SchedulingResult`](crate::preview::SchedulingResult). Only boundary
//! violations (malformed input, invalid transitions) and store failures
//! surface through this hierarchy.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use thiserror::Error;

use crate::task::TransitionError;

/// Core error type for timeblock-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed input rejected before the engine runs
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Status transition not present in the transition table
    #[error("Transition error: {0}")]
    Transition(#[from] TransitionError),

    /// External store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Preview workflow failure
    #[error("Preview error: {0}")]
    Preview(#[from] PreviewError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors raised at the engine boundary.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid time range
    #[error("Invalid time range: end ({end}) must be greater than start ({start})")]
    InvalidTimeRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Invalid date range
    #[error("Invalid date range: {start} to {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// Task duration below the minimum viable chunk
    #[error("Task '{task_id}' duration of {minutes} min is below the minimum chunk of {min_chunk} min")]
    DurationBelowMinimum {
        task_id: String,
        minutes: u32,
        min_chunk: i64,
    },

    /// Working-hours policy with an empty daily span
    #[error("Working hours start ({start}) must be before end ({end})")]
    EmptyWorkingHours { start: NaiveTime, end: NaiveTime },

    /// Manual placement overlapping a committed block
    #[error("Placement for task '{task_id}' overlaps committed block '{block_id}'")]
    PlacementConflict { task_id: String, block_id: String },
}

/// Errors reported by the external task/schedule/policy stores.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Task not found
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Block not found
    #[error("Schedule block not found: {0}")]
    BlockNotFound(String),

    /// No working-hours policy registered for the user
    #[error("No working-hours policy for user: {0}")]
    PolicyNotFound(String),

    /// Batch commit rejected by the store (all-or-nothing)
    #[error("Commit rejected: {0}")]
    CommitRejected(String),
}

/// Errors raised by the preview/apply workflow.
#[derive(Error, Debug)]
pub enum PreviewError {
    /// An operation required an active preview
    #[error("No active preview to {action}")]
    NoActivePreview { action: &'static str },

    /// The committed schedule moved since the preview snapshot
    #[error("Stale preview: schedule version moved from {expected} to {found} since the snapshot")]
    Stale { expected: u64, found: u64 },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
