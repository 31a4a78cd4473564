// src/dag/state_manager.rs

//! Per-pass state transitions for tasks in the scheduler.

use tracing::debug;

use crate::dag::graph::{ExecutionGraph, NodeId};
use crate::dag::task_info::{TaskInfo, TaskState};

/// Manages per-pass state transitions for tasks.
pub struct StateManager<'a, T> {
    graph: &'a ExecutionGraph<T>,
    tasks: &'a mut [TaskInfo],
}

impl<'a, T> StateManager<'a, T> {
    pub fn new(graph: &'a ExecutionGraph<T>, tasks: &'a mut [TaskInfo]) -> Self {
        Self { graph, tasks }
    }

    /// Whether every dependency of `id` is `Done` in this pass.
    pub fn deps_satisfied(&self, id: NodeId) -> bool {
        self.graph
            .dependencies_of(id)
            .iter()
            .all(|&dep| self.tasks[dep].state == TaskState::Done)
    }

    /// Move each `Pending`/`Waiting` candidate whose dependencies are all done
    /// to `Ready`; the rest become (or stay) `Waiting`.
    ///
    /// Returns the newly ready nodes in candidate order.
    pub fn promote_ready<I>(&mut self, candidates: I) -> Vec<NodeId>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let mut ready = Vec::new();

        for id in candidates {
            if !matches!(self.tasks[id].state, TaskState::Pending | TaskState::Waiting) {
                continue;
            }

            if self.deps_satisfied(id) {
                debug!(task = %self.graph.identity(id), "dependencies satisfied; marking Ready");
                self.tasks[id].state = TaskState::Ready;
                ready.push(id);
            } else {
                self.tasks[id].state = TaskState::Waiting;
            }
        }

        ready
    }

    /// Mark every not-yet-terminal transitive dependent of `failed` as
    /// `Blocked`.
    ///
    /// Returns the newly blocked nodes (excluding `failed` itself).
    pub fn mark_dependents_blocked(&mut self, failed: NodeId) -> Vec<NodeId> {
        let mut stack: Vec<NodeId> = self.graph.dependents_of(failed).to_vec();
        let mut newly_blocked = Vec::new();

        while let Some(id) = stack.pop() {
            let info = &mut self.tasks[id];
            match info.state {
                TaskState::Pending | TaskState::Waiting | TaskState::Ready => {
                    info.state = TaskState::Blocked;
                    info.blocked_by = Some(failed);
                    debug!(
                        task = %self.graph.identity(id),
                        failed = %self.graph.identity(failed),
                        "blocking dependent of failed task"
                    );
                    newly_blocked.push(id);
                    stack.extend(self.graph.dependents_of(id).iter().copied());
                }
                // Running tasks cannot depend on an unfinished node; terminal
                // ones are left alone.
                TaskState::Running | TaskState::Done | TaskState::Failed | TaskState::Blocked => {}
            }
        }

        newly_blocked
    }
}
