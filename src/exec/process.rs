// src/exec/process.rs

//! External process adapter.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::{DeckError, Result};
use crate::exec::invocation::{ExternalInvocation, InvocationOutput};

/// Trait abstracting how external commands are executed.
///
/// Production code uses [`TokioProcessRunner`]; tests can provide their own
/// implementation that simulates the converter and merge tools.
pub trait ProcessRunner: Send + Sync + Debug {
    /// Run the process to completion and return its exit code and output.
    ///
    /// A non-zero exit is *not* an error at this level; see [`invoke`].
    fn run_process<'a>(
        &'a self,
        invocation: &'a ExternalInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<InvocationOutput>> + Send + 'a>>;
}

/// Run `invocation` through `runner`, turning a non-zero exit into
/// [`DeckError::ExternalTool`]. No retries.
pub async fn invoke(
    runner: &dyn ProcessRunner,
    invocation: &ExternalInvocation,
) -> Result<InvocationOutput> {
    info!(cmd = %invocation, cwd = ?invocation.cwd, "invoking external tool");

    let output = runner.run_process(invocation).await?;

    if output.success() {
        Ok(output)
    } else {
        warn!(
            program = %invocation.program,
            exit_code = output.exit_code,
            "external tool failed"
        );
        Err(DeckError::ExternalTool {
            program: invocation.program.clone(),
            exit_code: output.exit_code,
            stderr: output.stderr.trim().to_string(),
        })
    }
}

/// Real runner based on `tokio::process::Command`.
#[derive(Debug, Clone, Default)]
pub struct TokioProcessRunner;

impl ProcessRunner for TokioProcessRunner {
    fn run_process<'a>(
        &'a self,
        invocation: &'a ExternalInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<InvocationOutput>> + Send + 'a>> {
        Box::pin(async move {
            let mut cmd = Command::new(&invocation.program);
            cmd.args(&invocation.args)
                .current_dir(&invocation.cwd)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            let mut child = cmd
                .spawn()
                .with_context(|| format!("spawning `{}`", invocation.program))?;

            // Drain both pipes concurrently so neither buffer fills up.
            let stdout = child.stdout.take().map(|out| {
                tokio::spawn(collect_lines(out, invocation.program.clone(), "stdout"))
            });
            let stderr = child.stderr.take().map(|err| {
                tokio::spawn(collect_lines(err, invocation.program.clone(), "stderr"))
            });

            let status = child
                .wait()
                .await
                .with_context(|| format!("waiting for `{}`", invocation.program))?;

            let stdout = match stdout {
                Some(handle) => handle.await.unwrap_or_default(),
                None => String::new(),
            };
            let stderr = match stderr {
                Some(handle) => handle.await.unwrap_or_default(),
                None => String::new(),
            };

            let exit_code = status.code().unwrap_or(-1);
            debug!(program = %invocation.program, exit_code, "process exited");

            Ok(InvocationOutput {
                exit_code,
                stdout,
                stderr,
            })
        })
    }
}

async fn collect_lines<R>(reader: R, program: String, stream: &'static str) -> String
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut buf = String::new();

    while let Ok(Some(line)) = lines.next_line().await {
        debug!(program = %program, stream, "{}", line);
        buf.push_str(&line);
        buf.push('\n');
    }

    buf
}
