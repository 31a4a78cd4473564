// src/exec/pool.rs

//! Worker side of the engine: runs scheduled tasks on the tokio runtime and
//! reports completions back as [`EngineEvent`]s.

use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::dag::ScheduledTask;
use crate::engine::{EngineEvent, TaskOutcome};
use crate::errors::{DeckError, StructuralError};
use crate::task::Task;

/// Spawns each dispatched task in its own tokio task.
///
/// Concurrency is bounded by the runtime, which never has more than
/// `workers` tasks dispatched at once.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    runtime_tx: mpsc::Sender<EngineEvent>,
}

impl WorkerPool {
    pub fn new(runtime_tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { runtime_tx }
    }

    /// Run `scheduled` in the background; exactly one `TaskCompleted` event
    /// is sent for it, also when the task panics.
    pub fn dispatch<T: Task>(&self, scheduled: ScheduledTask<T>) {
        let tx = self.runtime_tx.clone();
        let id = scheduled.id;
        let identity = scheduled.identity.clone();

        tokio::spawn(async move {
            let outcome = match tokio::spawn(run_scheduled(scheduled)).await {
                Ok(outcome) => outcome,
                Err(join_err) => {
                    error!(task = %identity, error = %join_err, "task panicked");
                    TaskOutcome::Failed(Arc::new(DeckError::Other(anyhow!(
                        "task {identity} panicked: {join_err}"
                    ))))
                }
            };

            if tx
                .send(EngineEvent::TaskCompleted { id, outcome })
                .await
                .is_err()
            {
                debug!(task = %identity, "runtime gone; dropping completion");
            }
        });
    }
}

/// Run one task and translate the result into a [`TaskOutcome`].
///
/// The output is checked before running (a concurrent writer or an earlier
/// sibling may have produced it) and again afterwards: a successful `run`
/// that leaves the output incomplete is a failure.
async fn run_scheduled<T: Task>(scheduled: ScheduledTask<T>) -> TaskOutcome {
    let ScheduledTask {
        identity,
        task,
        deps,
        output,
        ..
    } = scheduled;

    if output.is_complete() {
        debug!(task = %identity, "output complete at dispatch; skipping run");
        return TaskOutcome::Success { ran: false };
    }

    info!(task = %identity, "starting task");
    let started = Instant::now();

    match task.run(&deps).await {
        Ok(()) if output.is_complete() => {
            info!(
                task = %identity,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "task finished"
            );
            TaskOutcome::Success { ran: true }
        }
        Ok(()) => {
            error!(task = %identity, "task reported success but its output is incomplete");
            TaskOutcome::Failed(Arc::new(StructuralError::OutputMissing(identity).into()))
        }
        Err(err) => {
            error!(task = %identity, error = %err, "task failed");
            TaskOutcome::Failed(Arc::new(err))
        }
    }
}
