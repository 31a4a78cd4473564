// src/dag/scheduler.rs

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::anyhow;
use tracing::{debug, info, warn};

use crate::dag::graph::{ExecutionGraph, NodeId, Resolution};
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::StateManager;
use crate::dag::task_info::{ScheduledTask, TaskInfo, TaskState};
use crate::engine::{PassReport, TaskOutcome, TaskReport};
use crate::errors::DeckError;
use crate::task::TaskIdentity;

/// Scheduler holds the resolved graph plus mutable per-pass state.
///
/// It is responsible for:
/// - turning resolution results into initial states (memoized tasks are
///   `Done`, unresolvable ones `Failed`)
/// - deciding when a task is ready (all dependencies done)
/// - handing out at most as many ready tasks as the caller has capacity for
/// - recording completions and blocking dependents of failures
///
/// It performs no IO; the engine runtime drives it.
#[derive(Debug)]
pub struct Scheduler<T> {
    graph: ExecutionGraph<T>,
    tasks: Vec<TaskInfo>,
    ready: VecDeque<NodeId>,
}

impl<T> Scheduler<T> {
    pub fn new(graph: ExecutionGraph<T>) -> Self {
        let tasks = vec![TaskInfo::default(); graph.len()];
        Self {
            graph,
            tasks,
            ready: VecDeque::new(),
        }
    }

    pub fn graph(&self) -> &ExecutionGraph<T> {
        &self.graph
    }

    pub fn state(&self, id: NodeId) -> TaskState {
        self.tasks[id].state
    }

    /// Read-only view of the given task's state.
    pub fn state_of(&self, identity: &TaskIdentity) -> Option<TaskState> {
        self.graph.lookup(identity).map(|id| self.tasks[id].state)
    }

    /// Whether every task has reached `Done`, `Failed` or `Blocked`.
    pub fn is_finished(&self) -> bool {
        self.tasks.iter().all(|info| info.state.is_terminal())
    }

    /// Apply resolution results and compute the first ready set.
    pub fn start(&mut self) -> SchedulerStep {
        let mut step = SchedulerStep::default();
        let mut failed = Vec::new();
        let mut candidates = Vec::new();

        for id in self.graph.node_ids() {
            let info = &mut self.tasks[id];
            match self.graph.resolution(id) {
                Resolution::UpToDate(_) => {
                    info.state = TaskState::Done;
                }
                Resolution::Incomplete(_) => {
                    candidates.push(id);
                }
                Resolution::Failed(err) => {
                    info.state = TaskState::Failed;
                    info.error = Some(Arc::clone(err));
                    failed.push(id);
                }
                Resolution::Unresolved => {
                    info.state = TaskState::Failed;
                    info.error = Some(Arc::new(DeckError::Other(anyhow!(
                        "task was never resolved"
                    ))));
                    failed.push(id);
                }
            }
        }

        let mut manager = StateManager::new(&self.graph, &mut self.tasks);
        for &id in &failed {
            let blocked = manager.mark_dependents_blocked(id);
            step.newly_blocked
                .extend(blocked.into_iter().map(|b| self.graph.identity(b).clone()));
        }
        let newly_ready = manager.promote_ready(candidates);

        step.newly_failed = failed
            .into_iter()
            .map(|id| self.graph.identity(id).clone())
            .collect();
        step.newly_ready = newly_ready
            .iter()
            .map(|&id| self.graph.identity(id).clone())
            .collect();
        self.ready.extend(newly_ready);
        step.pass_finished = self.is_finished();

        info!(
            tasks = self.graph.len(),
            ready = self.ready.len(),
            failed = step.newly_failed.len(),
            "scheduler: pass started"
        );

        step
    }

    /// Record the outcome of a task previously returned by [`take_ready`].
    ///
    /// [`take_ready`]: Scheduler::take_ready
    pub fn handle_completion(&mut self, id: NodeId, outcome: TaskOutcome) -> SchedulerStep {
        let mut step = SchedulerStep::default();

        if self.tasks.get(id).map(|info| info.state) != Some(TaskState::Running) {
            warn!(node = id, "completion for task that is not running; ignoring");
            step.pass_finished = self.is_finished();
            return step;
        }

        let identity = self.graph.identity(id).clone();

        match outcome {
            TaskOutcome::Success { ran } => {
                let info = &mut self.tasks[id];
                info.state = TaskState::Done;
                info.ran = ran;
                debug!(task = %identity, ran, "task done");

                let dependents = self.graph.dependents_of(id).to_vec();
                let mut manager = StateManager::new(&self.graph, &mut self.tasks);
                let newly_ready = manager.promote_ready(dependents);
                step.newly_ready = newly_ready
                    .iter()
                    .map(|&r| self.graph.identity(r).clone())
                    .collect();
                self.ready.extend(newly_ready);
            }
            TaskOutcome::Failed(err) => {
                let info = &mut self.tasks[id];
                info.state = TaskState::Failed;
                info.ran = true;
                warn!(task = %identity, error = %err, "task failed; blocking dependents");
                info.error = Some(err);

                let mut manager = StateManager::new(&self.graph, &mut self.tasks);
                let blocked = manager.mark_dependents_blocked(id);
                step.newly_blocked = blocked
                    .into_iter()
                    .map(|b| self.graph.identity(b).clone())
                    .collect();
                step.newly_failed.push(identity);
            }
        }

        step.pass_finished = self.is_finished();
        if step.pass_finished {
            info!("scheduler: all tasks terminal; pass finished");
        }
        step
    }

    /// Build the per-task summary of the pass.
    pub fn report(&self) -> PassReport {
        let tasks = self
            .graph
            .node_ids()
            .map(|id| {
                let info = &self.tasks[id];
                TaskReport {
                    identity: self.graph.identity(id).clone(),
                    state: info.state,
                    ran: info.ran,
                    error: info.error.clone(),
                    blocked_by: info.blocked_by.map(|b| self.graph.identity(b).clone()),
                }
            })
            .collect();

        PassReport { tasks }
    }
}

impl<T> Scheduler<T> {
    /// Hand out up to `limit` ready tasks, marking them `Running`.
    pub fn take_ready(&mut self, limit: usize) -> Vec<ScheduledTask<T>> {
        let mut scheduled = Vec::new();

        while scheduled.len() < limit {
            let Some(id) = self.ready.pop_front() else {
                break;
            };

            // Ready nodes always come from an incomplete resolution.
            let Some(output) = self.graph.output(id).cloned() else {
                warn!(task = %self.graph.identity(id), "ready task has no resolved output; skipping");
                continue;
            };

            self.tasks[id].state = TaskState::Running;
            debug!(task = %self.graph.identity(id), "dispatching task");

            scheduled.push(ScheduledTask {
                id,
                identity: self.graph.identity(id).clone(),
                task: Arc::clone(self.graph.task(id)),
                deps: self
                    .graph
                    .dependencies_of(id)
                    .iter()
                    .map(|&dep| Arc::clone(self.graph.task(dep)))
                    .collect(),
                output,
            });
        }

        scheduled
    }
}
