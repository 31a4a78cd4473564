// src/engine/mod.rs

//! Orchestration engine.
//!
//! This module ties together:
//! - the resolve phase ([`crate::dag::resolve`]) that builds the graph
//! - the pure scheduler state machine ([`crate::dag::Scheduler`])
//! - the async runtime loop ([`runtime`]) that dispatches ready tasks to the
//!   worker pool and feeds completions back into the scheduler
//!
//! [`Engine::run`] performs one full pass and returns a [`PassReport`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::dag::{ExecutionGraph, NodeId, Scheduler, resolve};
use crate::errors::{DeckError, Result};
use crate::exec::WorkerPool;
use crate::task::Task;

pub mod report;
pub mod runtime;

pub use report::{PassReport, TaskReport};
pub use runtime::Runtime;

/// Default worker pool size.
pub const DEFAULT_WORKERS: usize = 6;

/// Outcome of one dispatched task for the scheduler.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    /// Output is complete. `ran` is false when the output turned out to be
    /// complete at dispatch time and `run` was skipped.
    Success { ran: bool },
    Failed(Arc<DeckError>),
}

/// Events flowing from workers into the runtime.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    TaskCompleted { id: NodeId, outcome: TaskOutcome },
}

/// Runs passes over task graphs with a bounded number of concurrent tasks.
#[derive(Debug, Clone, Copy)]
pub struct Engine {
    workers: usize,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl Engine {
    /// `workers` is clamped to at least one.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Resolve `roots` and execute the resulting graph.
    ///
    /// Returns `Err` only for structural problems that prevent the pass from
    /// starting; task failures are reported in the [`PassReport`].
    pub async fn run<T: Task>(&self, roots: Vec<T>) -> Result<PassReport> {
        let graph = resolve(roots)?;
        self.execute(graph).await
    }

    /// Execute an already resolved graph.
    pub async fn execute<T: Task>(&self, graph: ExecutionGraph<T>) -> Result<PassReport> {
        info!(tasks = graph.len(), workers = self.workers, "starting pass");

        let (tx, rx) = mpsc::channel::<EngineEvent>(64);
        let pool = WorkerPool::new(tx);
        let runtime = Runtime::new(Scheduler::new(graph), rx, pool, self.workers);
        runtime.run().await
    }
}
