// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::task::TaskIdentity;

/// Structured result of a single scheduler "step".
///
/// This is useful for tests that want to manually step the DAG and make
/// assertions about what changed.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Tasks that became ready to run as a result of this step.
    pub newly_ready: Vec<TaskIdentity>,
    /// Tasks that were newly marked as failed in this step.
    pub newly_failed: Vec<TaskIdentity>,
    /// Tasks that will never be dispatched because of a failure upstream.
    pub newly_blocked: Vec<TaskIdentity>,
    /// Whether every task is now in a terminal state.
    pub pass_finished: bool,
}
