// src/errors.rs

//! Crate-wide error types.
//!
//! Errors fall in three families:
//! - structural errors abort a pass before anything executes,
//! - tool / document errors fail only the task that raised them (and block
//!   its dependents),
//! - everything else (IO, config) surfaces where it happens.

use std::path::PathBuf;

use thiserror::Error;

use crate::task::TaskIdentity;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error("external tool `{program}` exited with code {exit_code}: {stderr}")]
    ExternalTool {
        program: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("document error in {path:?}: {message}")]
    DocumentFormat { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Graph-shape errors detected while resolving a pass.
#[derive(Error, Debug)]
pub enum StructuralError {
    #[error("cycle detected in task graph involving {0}")]
    Cycle(TaskIdentity),

    #[error("path {path:?} is claimed by both {first} and {second}; only readers may share a path")]
    PathCollision {
        path: PathBuf,
        first: TaskIdentity,
        second: TaskIdentity,
    },

    #[error("{0} finished without producing its output")]
    OutputMissing(TaskIdentity),
}

impl DeckError {
    pub fn document(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        DeckError::DocumentFormat {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error aborts the whole pass rather than a single task.
    pub fn is_structural(&self) -> bool {
        matches!(self, DeckError::Structural(StructuralError::Cycle(_) | StructuralError::PathCollision { .. }))
    }
}

pub type Result<T> = std::result::Result<T, DeckError>;
