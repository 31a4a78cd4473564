// src/dag/mod.rs

//! Task graph construction and scheduling.
//!
//! - [`resolve`] expands root tasks into an [`ExecutionGraph`].
//! - [`graph`] holds the deduplicated nodes and their edges.
//! - [`scheduler`] contains the per-pass state machine that decides
//!   which tasks are ready to run, and when dependents can be scheduled.
//! - [`task_info`] provides per-task state and scheduled task types.
//! - [`scheduler_step`] defines the result type for scheduler steps.
//! - [`state_manager`] manages per-pass state transitions.

pub mod graph;
pub mod resolve;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task_info;

pub use graph::{ExecutionGraph, NodeId, Resolution};
pub use resolve::resolve;
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use task_info::{ScheduledTask, TaskInfo, TaskState};
