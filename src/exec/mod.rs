// src/exec/mod.rs

//! Execution layer.
//!
//! - [`pool`] runs scheduled tasks on the tokio runtime and reports
//!   completions back to the engine.
//! - [`invocation`] describes one external command run.
//! - [`process`] provides the `ProcessRunner` trait and the real
//!   `TokioProcessRunner`; tests replace it with a fake implementation.
//! - [`template`] turns configured tool templates into invocations.

pub mod invocation;
pub mod pool;
pub mod process;
pub mod template;

pub use invocation::{ExternalInvocation, InvocationOutput};
pub use pool::WorkerPool;
pub use process::{ProcessRunner, TokioProcessRunner, invoke};
pub use template::{ToolTemplate, ToolVars};
