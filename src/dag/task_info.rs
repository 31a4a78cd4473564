// src/dag/task_info.rs

//! Per-pass task state and the dispatch descriptor handed to workers.

use std::sync::Arc;

use crate::dag::graph::NodeId;
use crate::errors::DeckError;
use crate::target::TaskOutput;
use crate::task::TaskIdentity;

/// Per-pass state of a task.
///
/// `Pending → Waiting → Ready → Running → {Done | Failed}`. A task whose
/// output was complete at resolution goes straight from `Pending` to `Done`;
/// a task downstream of a failure ends as `Blocked` without being dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Resolved but not yet examined by the scheduler.
    Pending,
    /// Waiting on at least one dependency that is not done.
    Waiting,
    /// All dependencies done; queued for a worker.
    Ready,
    /// Handed to a worker.
    Running,
    Done,
    Failed,
    /// Never dispatched because a dependency failed or was blocked.
    Blocked,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Done | TaskState::Failed | TaskState::Blocked)
    }
}

/// Mutable scheduler bookkeeping for one node.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub state: TaskState,
    /// Whether `run` was invoked during this pass.
    pub ran: bool,
    pub error: Option<Arc<DeckError>>,
    /// The failed dependency that caused a `Blocked` state.
    pub blocked_by: Option<NodeId>,
}

impl Default for TaskInfo {
    fn default() -> Self {
        Self {
            state: TaskState::Pending,
            ran: false,
            error: None,
            blocked_by: None,
        }
    }
}

/// Description of a task that the scheduler wants a worker to run now.
#[derive(Debug)]
pub struct ScheduledTask<T> {
    pub id: NodeId,
    pub identity: TaskIdentity,
    pub task: Arc<T>,
    /// Resolved dependencies, in declaration order.
    pub deps: Vec<Arc<T>>,
    pub output: TaskOutput,
}
