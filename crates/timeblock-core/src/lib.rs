//! # Timeblock Core Library
//!
//! This library provides the automatic time-blocking engine for Timeblock:
//! given a user's pending tasks and existing calendar commitments, it
//! computes a conflict-free placement of each task (or a split sequence of
//! sub-placements) into the user's available working time, subject to
//! priority, deadline, and capacity constraints.
//!
//! ## Architecture
//!
//! - **Availability**: pure computation of free windows from working-hour
//!   policies and committed blocks
//! - **Prioritizer**: deterministic placement ordering (priority, deadline,
//!   recency)
//! - **Placement Engine**: first-fit placement with deadline feasibility and
//!   automatic splitting of oversized tasks
//! - **Preview Workflow**: one scheduling run held as a reversible draft,
//!   applied all-or-nothing behind an optimistic version check
//! - **Stores**: narrow trait seams to the host's task/schedule/policy
//!   persistence, with in-memory implementations
//!
//! The engine itself is synchronous and deterministic; all I/O lives behind
//! the store traits.
//!
//! ## Key Components
//!
//! - [`PlacementEngine`]: core placement algorithm
//! - [`PreviewWorkflow`]: preview/apply/cancel/retry driver
//! - [`compute_availability`]: free-window computation
//! - [`Task`] / [`ScheduleBlock`]: the records flowing through the engine

pub mod availability;
pub mod conflict;
pub mod error;
pub mod preview;
pub mod prioritizer;
pub mod schedule;
pub mod scheduler;
pub mod store;
pub mod task;

pub use availability::{compute_availability, AvailabilityWindow, SLOT_MINUTES};
pub use error::{CoreError, PreviewError, Result, StoreError, ValidationError};
pub use preview::{PreviewWorkflow, SchedulingResult};
pub use prioritizer::order_tasks;
pub use schedule::{BlockId, ScheduleBlock, SplitMeta, SplitReason, WorkingHoursPolicy};
pub use scheduler::{
    ConflictReason, PlacementEngine, PlacementResult, SchedulerConfig, UnplacedTask,
};
pub use store::{
    InMemoryPolicyProvider, InMemoryScheduleStore, InMemoryTaskStore, PolicyProvider,
    ScheduleStore, TaskStore,
};
pub use task::{
    Task, TaskCategory, TaskId, TaskPriority, TaskStatus, TransitionError, UserId,
};
