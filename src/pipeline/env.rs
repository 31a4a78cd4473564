// src/pipeline/env.rs

//! Collaborators and settings shared by every task of a deck build.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};

use crate::config::ConfigFile;
use crate::document::{DocumentBackend, PptxBackend};
use crate::errors::{DeckError, Result};
use crate::exec::{ProcessRunner, TokioProcessRunner, ToolTemplate};
use crate::fs::{FileSystem, RealFileSystem};
use crate::target::FileTarget;
use crate::types::CompletenessCheck;

/// Default format of the `[date]` stamp, e.g. `07, Mar 2026 14:05:09 PM`.
pub const DEFAULT_DATE_FORMAT: &str = "%d, %b %Y %H:%M:%S %p";

/// Placeholder always replaced with the build timestamp.
pub const DATE_PLACEHOLDER: &str = "[date]";

/// Whether `format` is a valid strftime-style format string for chrono.
pub fn is_valid_date_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Text substitutions applied by `RenderDate`.
///
/// The timestamp is rendered once when the settings are built, so all slides
/// of one pass carry the same stamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    timestamp: String,
    replacements: BTreeMap<String, String>,
}

impl RenderSettings {
    /// Stamp `now` with `date_format`. `replacements` maps placeholder names
    /// (without brackets) to their values: `title` replaces `[title]`.
    pub fn new(
        date_format: &str,
        now: DateTime<Local>,
        replacements: BTreeMap<String, String>,
    ) -> Result<Self> {
        if !is_valid_date_format(date_format) {
            return Err(DeckError::Config(format!("invalid date format {date_format:?}")));
        }

        let mut timestamp = String::new();
        write!(timestamp, "{}", now.format(date_format))
            .map_err(|_| DeckError::Config(format!("cannot render date format {date_format:?}")))?;

        Ok(Self {
            timestamp,
            replacements,
        })
    }

    /// Settings with a fixed timestamp; mostly useful in tests.
    pub fn fixed(timestamp: impl Into<String>, replacements: BTreeMap<String, String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            replacements,
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// `(pattern, value)` pairs in application order, date first.
    pub fn substitutions(&self) -> Vec<(String, String)> {
        std::iter::once((DATE_PLACEHOLDER.to_string(), self.timestamp.clone()))
            .chain(
                self.replacements
                    .iter()
                    .map(|(name, value)| (format!("[{name}]"), value.clone())),
            )
            .collect()
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        let now = Local::now();
        Self {
            timestamp: now.format(DEFAULT_DATE_FORMAT).to_string(),
            replacements: BTreeMap::new(),
        }
    }
}

/// Everything the pipeline tasks need besides their own parameters.
#[derive(Debug, Clone)]
pub struct PipelineEnv {
    pub fs: Arc<dyn FileSystem>,
    pub documents: Arc<dyn DocumentBackend>,
    pub runner: Arc<dyn ProcessRunner>,
    pub converter: ToolTemplate,
    pub merger: ToolTemplate,
    pub render: RenderSettings,
    pub completeness: CompletenessCheck,
}

impl Default for PipelineEnv {
    fn default() -> Self {
        Self::new(Arc::new(RealFileSystem), Arc::new(TokioProcessRunner))
    }
}

impl PipelineEnv {
    /// Environment with the `.pptx` backend on `fs`, the default tool
    /// templates and a timestamp taken now.
    pub fn new(fs: Arc<dyn FileSystem>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            documents: Arc::new(PptxBackend::new(Arc::clone(&fs))),
            fs,
            runner,
            converter: ToolTemplate::default_converter(),
            merger: ToolTemplate::default_merger(),
            render: RenderSettings::default(),
            completeness: CompletenessCheck::default(),
        }
    }

    /// Environment for a real run as described by `cfg`. The timestamp is
    /// taken now.
    pub fn from_config(
        cfg: &ConfigFile,
        fs: Arc<dyn FileSystem>,
        runner: Arc<dyn ProcessRunner>,
    ) -> Result<Self> {
        let render = RenderSettings::new(
            &cfg.render.date_format,
            Local::now(),
            cfg.render.replacements.clone(),
        )?;

        Ok(Self::new(fs, runner)
            .with_converter(cfg.tools.converter.clone())
            .with_merger(cfg.tools.merger.clone())
            .with_render(render)
            .with_completeness(cfg.engine.completeness))
    }

    pub fn with_documents(mut self, documents: Arc<dyn DocumentBackend>) -> Self {
        self.documents = documents;
        self
    }

    pub fn with_converter(mut self, converter: ToolTemplate) -> Self {
        self.converter = converter;
        self
    }

    pub fn with_merger(mut self, merger: ToolTemplate) -> Self {
        self.merger = merger;
        self
    }

    pub fn with_render(mut self, render: RenderSettings) -> Self {
        self.render = render;
        self
    }

    pub fn with_completeness(mut self, completeness: CompletenessCheck) -> Self {
        self.completeness = completeness;
        self
    }

    pub(crate) fn target(&self, path: PathBuf) -> FileTarget {
        FileTarget::new(path, Arc::clone(&self.fs), self.completeness)
    }
}
