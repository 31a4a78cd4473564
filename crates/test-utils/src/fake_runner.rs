//! A fake `ProcessRunner` standing in for the converter and merge tools.
//!
//! Two programs are understood:
//! - `fake-convert <input> <output>` writes `page:<input file name>\n` to
//!   the output,
//! - `fake-merge <inputs...> <output>` concatenates its inputs into the
//!   output, so the merged file lists the pages in argument order.
//!
//! Anything else exits with code 127. Relative path arguments are resolved
//! against the invocation's `cwd`, as a spawned process would see them.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use deckbuild::errors::Result;
use deckbuild::exec::{ExternalInvocation, InvocationOutput, ProcessRunner, ToolTemplate};
use deckbuild::fs::FileSystem;

pub const CONVERT_PROGRAM: &str = "fake-convert";
pub const MERGE_PROGRAM: &str = "fake-merge";

#[derive(Debug, Default)]
struct RunnerState {
    invocations: Vec<ExternalInvocation>,
    /// Inputs whose file name contains one of these fail to convert.
    failing: Vec<String>,
    /// Conversion delay keyed by a substring of the input file name.
    delays: Vec<(String, Duration)>,
    completed_conversions: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct FakeToolRunner {
    fs: Arc<dyn FileSystem>,
    state: Arc<Mutex<RunnerState>>,
    running: Arc<AtomicUsize>,
    max_running: Arc<AtomicUsize>,
}

impl FakeToolRunner {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            state: Arc::default(),
            running: Arc::default(),
            max_running: Arc::default(),
        }
    }

    pub fn converter_template() -> ToolTemplate {
        ToolTemplate {
            program: CONVERT_PROGRAM.to_string(),
            args: vec!["{input}".to_string(), "{output}".to_string()],
        }
    }

    pub fn merger_template() -> ToolTemplate {
        ToolTemplate {
            program: MERGE_PROGRAM.to_string(),
            args: vec!["{inputs}".to_string(), "{output}".to_string()],
        }
    }

    /// Make conversion of inputs whose file name contains `needle` fail.
    pub fn fail_on(&self, needle: &str) {
        self.state.lock().unwrap().failing.push(needle.to_string());
    }

    pub fn clear_failures(&self) {
        self.state.lock().unwrap().failing.clear();
    }

    /// Delay conversion of inputs whose file name contains `needle`.
    pub fn delay_on(&self, needle: &str, delay: Duration) {
        self.state
            .lock()
            .unwrap()
            .delays
            .push((needle.to_string(), delay));
    }

    pub fn invocations(&self) -> Vec<ExternalInvocation> {
        self.state.lock().unwrap().invocations.clone()
    }

    pub fn invocations_of(&self, program: &str) -> Vec<ExternalInvocation> {
        self.invocations()
            .into_iter()
            .filter(|inv| inv.program == program)
            .collect()
    }

    /// Outputs of successful conversions, in completion order.
    pub fn completed_conversions(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().completed_conversions.clone()
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    pub fn reset_invocations(&self) {
        let mut state = self.state.lock().unwrap();
        state.invocations.clear();
        state.completed_conversions.clear();
    }

    async fn convert(&self, cwd: &Path, args: &[String]) -> Result<InvocationOutput> {
        let [input, output] = args else {
            return Ok(exit(2, "usage: fake-convert <input> <output>"));
        };
        let (input, output) = (cwd.join(input), cwd.join(output));
        let (input, output) = (input.as_path(), output.as_path());
        let name = file_name(input);

        let (fails, delay) = {
            let state = self.state.lock().unwrap();
            let fails = state.failing.iter().any(|n| name.contains(n.as_str()));
            let delay = state
                .delays
                .iter()
                .find(|(n, _)| name.contains(n.as_str()))
                .map(|(_, d)| *d);
            (fails, delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if !self.fs.exists(input) {
            return Ok(exit(1, &format!("{name}: no such file")));
        }
        if fails {
            // Leave a truncated file behind, like a converter dying mid-write.
            self.fs.write(output, b"")?;
            return Ok(exit(1, &format!("conversion failed for {name}")));
        }

        self.fs.write(output, format!("page:{name}\n").as_bytes())?;
        self.state
            .lock()
            .unwrap()
            .completed_conversions
            .push(output.to_path_buf());
        Ok(exit(0, ""))
    }

    fn merge(&self, cwd: &Path, args: &[String]) -> Result<InvocationOutput> {
        let Some((output, inputs)) = args.split_last() else {
            return Ok(exit(2, "usage: fake-merge <inputs...> <output>"));
        };

        let mut merged = Vec::new();
        for input in inputs {
            let path = cwd.join(input);
            if !self.fs.exists(&path) {
                return Ok(exit(1, &format!("{input}: no such file")));
            }
            merged.extend(self.fs.read(&path)?);
        }

        self.fs.write(&cwd.join(output), &merged)?;
        Ok(exit(0, ""))
    }
}

impl ProcessRunner for FakeToolRunner {
    fn run_process<'a>(
        &'a self,
        invocation: &'a ExternalInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<InvocationOutput>> + Send + 'a>> {
        Box::pin(async move {
            self.state
                .lock()
                .unwrap()
                .invocations
                .push(invocation.clone());

            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_running.fetch_max(now, Ordering::SeqCst);

            let result = match invocation.program.as_str() {
                CONVERT_PROGRAM => self.convert(&invocation.cwd, &invocation.args).await,
                MERGE_PROGRAM => self.merge(&invocation.cwd, &invocation.args),
                other => Ok(exit(127, &format!("{other}: command not found"))),
            };

            self.running.fetch_sub(1, Ordering::SeqCst);
            result
        })
    }
}

fn exit(code: i32, stderr: &str) -> InvocationOutput {
    InvocationOutput {
        exit_code: code,
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
