// src/task.rs

//! The unit of work the engine schedules.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use crate::errors::Result;
use crate::target::TaskOutput;

/// Boxed future returned by [`Task::run`].
pub type RunFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Structural identity of a task: its kind plus its parameters.
///
/// Two task values describe the same unit of work iff their identities are
/// equal, regardless of where they were constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskIdentity {
    pub kind: String,
    pub params: BTreeMap<String, String>,
}

impl TaskIdentity {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

impl fmt::Display for TaskIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind)?;
        for (i, (k, v)) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        write!(f, ")")
    }
}

/// A memoizable unit of work with a declared output and dependencies.
///
/// The engine calls [`output`](Task::output) and
/// [`dependencies`](Task::dependencies) at most once per task per pass, and
/// only during resolution. Neither may modify the filesystem; both may read
/// inputs (e.g. to count slides) and so may fail.
///
/// [`run`](Task::run) receives the resolved dependency tasks in declaration
/// order and must leave `output()` complete on success. On failure it must not
/// leave a complete-looking output behind.
pub trait Task: Send + Sync + Sized + 'static {
    fn identity(&self) -> TaskIdentity;

    fn output(&self) -> Result<TaskOutput>;

    fn dependencies(&self) -> Result<Vec<Self>>;

    /// Files read but never written by this task. Any number of tasks may
    /// read a file; none may also declare it as an output.
    fn inputs(&self) -> Vec<PathBuf> {
        Vec::new()
    }

    fn run<'a>(&'a self, deps: &'a [Arc<Self>]) -> RunFuture<'a>;
}
