// src/engine/report.rs

use std::fmt;
use std::sync::Arc;

use crate::dag::TaskState;
use crate::errors::DeckError;
use crate::task::TaskIdentity;

/// Final state of one task after a pass.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub identity: TaskIdentity,
    pub state: TaskState,
    /// Whether `run` was invoked in this pass.
    pub ran: bool,
    pub error: Option<Arc<DeckError>>,
    /// For blocked tasks: the failed task that blocked them.
    pub blocked_by: Option<TaskIdentity>,
}

/// Summary of one engine pass, in resolution order.
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    pub tasks: Vec<TaskReport>,
}

impl PassReport {
    /// True when every task ended `Done`.
    pub fn succeeded(&self) -> bool {
        self.tasks.iter().all(|t| t.state == TaskState::Done)
    }

    pub fn get(&self, identity: &TaskIdentity) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| &t.identity == identity)
    }

    pub fn state_of(&self, identity: &TaskIdentity) -> Option<TaskState> {
        self.get(identity).map(|t| t.state)
    }

    pub fn failed(&self) -> impl Iterator<Item = &TaskReport> {
        self.tasks.iter().filter(|t| t.state == TaskState::Failed)
    }

    pub fn blocked(&self) -> impl Iterator<Item = &TaskReport> {
        self.tasks.iter().filter(|t| t.state == TaskState::Blocked)
    }

    /// Identities of tasks whose `run` was invoked.
    pub fn ran(&self) -> Vec<&TaskIdentity> {
        self.tasks
            .iter()
            .filter(|t| t.ran)
            .map(|t| &t.identity)
            .collect()
    }
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let done = self.tasks.iter().filter(|t| t.state == TaskState::Done).count();
        let ran = self
            .tasks
            .iter()
            .filter(|t| t.state == TaskState::Done && t.ran)
            .count();
        writeln!(
            f,
            "{} tasks: {} done ({} ran, {} up to date), {} failed, {} blocked",
            self.tasks.len(),
            done,
            ran,
            done - ran,
            self.failed().count(),
            self.blocked().count(),
        )?;

        for t in self.failed() {
            match &t.error {
                Some(err) => writeln!(f, "  FAILED  {}: {}", t.identity, err)?,
                None => writeln!(f, "  FAILED  {}", t.identity)?,
            }
        }
        for t in self.blocked() {
            match &t.blocked_by {
                Some(cause) => writeln!(f, "  BLOCKED {} (by {})", t.identity, cause)?,
                None => writeln!(f, "  BLOCKED {}", t.identity)?,
            }
        }
        Ok(())
    }
}
