// src/target.rs

//! Completion markers for task outputs.
//!
//! A [`Target`] only answers "is the artifact there?" and "where is it?". It
//! never writes anything; the owning task does. Completeness is evaluated on
//! every call so repeated checks observe the current filesystem state.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::fs::FileSystem;
use crate::types::CompletenessCheck;

pub trait Target: fmt::Debug + Send + Sync {
    fn is_complete(&self) -> bool;
    fn locate(&self) -> &Path;
}

/// Target backed by a single path on a [`FileSystem`].
#[derive(Clone)]
pub struct FileTarget {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
    check: CompletenessCheck,
}

impl FileTarget {
    pub fn new(path: impl Into<PathBuf>, fs: Arc<dyn FileSystem>, check: CompletenessCheck) -> Self {
        Self {
            path: path.into(),
            fs,
            check,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for FileTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileTarget")
            .field("path", &self.path)
            .field("check", &self.check)
            .finish_non_exhaustive()
    }
}

impl Target for FileTarget {
    fn is_complete(&self) -> bool {
        match self.check {
            CompletenessCheck::Exists => self.fs.exists(&self.path),
            CompletenessCheck::NonEmpty => self.fs.file_len(&self.path).is_some_and(|len| len > 0),
        }
    }

    fn locate(&self) -> &Path {
        &self.path
    }
}

/// Everything a task declares as its output.
#[derive(Debug, Clone)]
pub enum TaskOutput {
    /// One artifact.
    Single(FileTarget),
    /// One artifact per index, for steps whose arity is only known after
    /// inspecting their input (e.g. one file per slide).
    Indexed(BTreeMap<usize, FileTarget>),
    /// Wrapper over other tasks' outputs. Owns no artifact of its own and is
    /// complete exactly when every wrapped output is.
    Aggregate(Vec<TaskOutput>),
}

impl TaskOutput {
    pub fn is_complete(&self) -> bool {
        match self {
            TaskOutput::Single(t) => t.is_complete(),
            TaskOutput::Indexed(targets) => targets.values().all(Target::is_complete),
            TaskOutput::Aggregate(outputs) => outputs.iter().all(TaskOutput::is_complete),
        }
    }

    /// Paths of the artifacts this output's task is responsible for writing.
    pub fn owned_paths(&self) -> Vec<&Path> {
        match self {
            TaskOutput::Single(t) => vec![t.locate()],
            TaskOutput::Indexed(targets) => targets.values().map(|t| t.locate()).collect(),
            TaskOutput::Aggregate(_) => Vec::new(),
        }
    }

    pub fn single(&self) -> Option<&FileTarget> {
        match self {
            TaskOutput::Single(t) => Some(t),
            _ => None,
        }
    }

    pub fn at_index(&self, index: usize) -> Option<&FileTarget> {
        match self {
            TaskOutput::Indexed(targets) => targets.get(&index),
            _ => None,
        }
    }
}
