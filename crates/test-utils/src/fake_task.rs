//! In-memory tasks for engine tests.
//!
//! A [`FakeWorld`] holds named task specs and a shared [`MockFileSystem`].
//! [`FakeTask`]s look their spec up by name, so graphs (including cyclic
//! ones) can be described without constructing tasks recursively.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use deckbuild::errors::{DeckError, Result};
use deckbuild::fs::FileSystem;
use deckbuild::fs::mock::MockFileSystem;
use deckbuild::target::{FileTarget, TaskOutput};
use deckbuild::task::{RunFuture, Task, TaskIdentity};
use deckbuild::types::CompletenessCheck;

/// Behaviour of one fake task.
#[derive(Debug, Clone, Default)]
pub struct FakeSpec {
    output: Option<PathBuf>,
    reads: Vec<PathBuf>,
    deps: Vec<String>,
    fail: bool,
    write_output: bool,
    delay: Duration,
    broken_output: bool,
    broken_dependencies: bool,
}

impl FakeSpec {
    /// Task that writes `output` when run.
    pub fn writes(output: impl Into<PathBuf>) -> Self {
        Self {
            output: Some(output.into()),
            write_output: true,
            ..Default::default()
        }
    }

    /// Wrapper task whose output is the aggregate of its dependencies'.
    pub fn aggregate() -> Self {
        Self::default()
    }

    pub fn after<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Declare `path` as a file this task only reads.
    pub fn reads(mut self, path: impl Into<PathBuf>) -> Self {
        self.reads.push(path.into());
        self
    }

    /// `run` returns an external tool error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// `run` succeeds without writing its output.
    pub fn forgetful(mut self) -> Self {
        self.write_output = false;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// `output()` fails.
    pub fn broken_output(mut self) -> Self {
        self.broken_output = true;
        self
    }

    /// `dependencies()` fails.
    pub fn broken_dependencies(mut self) -> Self {
        self.broken_dependencies = true;
        self
    }
}

/// Shared state of a fake task graph.
#[derive(Debug, Default)]
pub struct FakeWorld {
    fs: MockFileSystem,
    specs: Mutex<HashMap<String, FakeSpec>>,
    runs: Mutex<Vec<String>>,
    dependency_calls: Mutex<HashMap<String, usize>>,
    running: AtomicUsize,
    max_running: AtomicUsize,
}

impl FakeWorld {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fs(&self) -> &MockFileSystem {
        &self.fs
    }

    pub fn define(self: &Arc<Self>, name: &str, spec: FakeSpec) -> FakeTask {
        self.specs.lock().unwrap().insert(name.to_string(), spec);
        self.task(name)
    }

    pub fn task(self: &Arc<Self>, name: &str) -> FakeTask {
        FakeTask {
            name: name.to_string(),
            world: Arc::clone(self),
        }
    }

    /// Names of tasks whose `run` was invoked, in start order.
    pub fn runs(&self) -> Vec<String> {
        self.runs.lock().unwrap().clone()
    }

    pub fn run_count(&self, name: &str) -> usize {
        self.runs().iter().filter(|n| *n == name).count()
    }

    pub fn dependency_calls(&self, name: &str) -> usize {
        self.dependency_calls
            .lock()
            .unwrap()
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    /// Highest number of `run` calls in progress at the same time.
    pub fn max_concurrency(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    fn spec(&self, name: &str) -> Result<FakeSpec> {
        self.specs
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| DeckError::Other(anyhow!("unknown fake task {name}")))
    }
}

#[derive(Debug, Clone)]
pub struct FakeTask {
    name: String,
    world: Arc<FakeWorld>,
}

impl FakeTask {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(name: &str) -> TaskIdentity {
        TaskIdentity::new("Fake").with("name", name)
    }
}

impl Task for FakeTask {
    fn identity(&self) -> TaskIdentity {
        FakeTask::id(&self.name)
    }

    fn output(&self) -> Result<TaskOutput> {
        let spec = self.world.spec(&self.name)?;
        if spec.broken_output {
            return Err(DeckError::document(
                format!("{}.pptx", self.name),
                "cannot determine output",
            ));
        }

        match spec.output {
            Some(path) => Ok(TaskOutput::Single(FileTarget::new(
                path,
                Arc::new(self.world.fs.clone()),
                CompletenessCheck::Exists,
            ))),
            None => spec
                .deps
                .iter()
                .map(|dep| self.world.task(dep).output())
                .collect::<Result<Vec<_>>>()
                .map(TaskOutput::Aggregate),
        }
    }

    fn dependencies(&self) -> Result<Vec<Self>> {
        *self
            .world
            .dependency_calls
            .lock()
            .unwrap()
            .entry(self.name.clone())
            .or_default() += 1;

        let spec = self.world.spec(&self.name)?;
        if spec.broken_dependencies {
            return Err(DeckError::document(
                format!("{}.pptx", self.name),
                "cannot list dependencies",
            ));
        }

        Ok(spec.deps.iter().map(|dep| self.world.task(dep)).collect())
    }

    fn inputs(&self) -> Vec<PathBuf> {
        self.world
            .spec(&self.name)
            .map(|spec| spec.reads)
            .unwrap_or_default()
    }

    fn run<'a>(&'a self, _deps: &'a [Arc<Self>]) -> RunFuture<'a> {
        Box::pin(async move {
            let spec = self.world.spec(&self.name)?;
            self.world.runs.lock().unwrap().push(self.name.clone());

            let now = self.world.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.world.max_running.fetch_max(now, Ordering::SeqCst);

            if !spec.delay.is_zero() {
                tokio::time::sleep(spec.delay).await;
            }

            let result = if spec.fail {
                Err(DeckError::ExternalTool {
                    program: "fake".to_string(),
                    exit_code: 1,
                    stderr: format!("{} failed", self.name),
                })
            } else {
                match (&spec.output, spec.write_output) {
                    (Some(path), true) => self
                        .world
                        .fs
                        .write(path, self.name.as_bytes())
                        .map_err(DeckError::from),
                    _ => Ok(()),
                }
            };

            self.world.running.fetch_sub(1, Ordering::SeqCst);
            result
        })
    }
}
