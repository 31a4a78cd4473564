// src/engine/runtime.rs

use std::fmt;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dag::{ScheduledTask, Scheduler};
use crate::errors::{DeckError, Result};
use crate::exec::WorkerPool;
use crate::task::Task;

use super::{EngineEvent, PassReport};

/// Drives the scheduler for one pass in response to [`EngineEvent`]s and
/// delegates task execution to the [`WorkerPool`].
///
/// The scheduler holds all pass semantics; this struct only does the async
/// part: reading completion events and keeping at most `workers` tasks in
/// flight.
pub struct Runtime<T> {
    scheduler: Scheduler<T>,
    event_rx: mpsc::Receiver<EngineEvent>,
    pool: WorkerPool,
    workers: usize,
    in_flight: usize,
}

impl<T> fmt::Debug for Runtime<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("graph", self.scheduler.graph())
            .field("workers", &self.workers)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl<T: Task> Runtime<T> {
    pub fn new(
        scheduler: Scheduler<T>,
        event_rx: mpsc::Receiver<EngineEvent>,
        pool: WorkerPool,
        workers: usize,
    ) -> Self {
        Self {
            scheduler,
            event_rx,
            pool,
            workers: workers.max(1),
            in_flight: 0,
        }
    }

    /// Main event loop.
    ///
    /// - Seeds the pass from the scheduler's initial ready set.
    /// - Consumes completion events and feeds them to the scheduler.
    /// - Tops the worker pool back up after every event.
    ///
    /// Already dispatched tasks always run to completion, even after a
    /// failure elsewhere; only dependents of the failure are held back.
    pub async fn run(mut self) -> Result<PassReport> {
        self.scheduler.start();

        loop {
            self.dispatch_ready();

            if self.scheduler.is_finished() {
                break;
            }

            if self.in_flight == 0 {
                return Err(DeckError::Other(anyhow!(
                    "scheduler stalled: no task running and none ready"
                )));
            }

            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    return Err(DeckError::Other(anyhow!(
                        "worker event channel closed with {} task(s) in flight",
                        self.in_flight
                    )));
                }
            };

            debug!(?event, "runtime received event");

            match event {
                EngineEvent::TaskCompleted { id, outcome } => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    self.scheduler.handle_completion(id, outcome);
                }
            }
        }

        let report = self.scheduler.report();
        info!(succeeded = report.succeeded(), "pass finished");
        Ok(report)
    }

    fn dispatch_ready(&mut self) {
        let capacity = self.workers.saturating_sub(self.in_flight);
        if capacity == 0 {
            return;
        }

        let batch: Vec<ScheduledTask<T>> = self.scheduler.take_ready(capacity);
        if batch.is_empty() {
            return;
        }

        let names: Vec<String> = batch.iter().map(|t| t.identity.to_string()).collect();
        debug!(?names, "spawning ready tasks");

        for task in batch {
            self.in_flight += 1;
            self.pool.dispatch(task);
        }
    }
}
