#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use deckbuild::config::{ConfigFile, RawConfigFile};
use deckbuild::errors::Result;
use deckbuild::exec::ToolTemplate;
use deckbuild::fs::FileSystem;
use deckbuild::pipeline::{PipelineEnv, RenderSettings};
use deckbuild::types::CompletenessCheck;

use crate::fake_runner::FakeToolRunner;

/// Timestamp used by [`fake_env`] so rendered slides are reproducible.
pub const FIXED_TIMESTAMP: &str = "01, Jan 2030 09:00:00 AM";

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.engine.workers = workers;
        self
    }

    pub fn completeness(mut self, check: CompletenessCheck) -> Self {
        self.config.engine.completeness = check;
        self
    }

    pub fn date_format(mut self, format: &str) -> Self {
        self.config.render.date_format = format.to_string();
        self
    }

    pub fn replacement(mut self, name: &str, value: &str) -> Self {
        self.config
            .render
            .replacements
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn converter(mut self, tool: ToolTemplate) -> Self {
        self.config.tools.converter = tool;
        self
    }

    pub fn merger(mut self, tool: ToolTemplate) -> Self {
        self.config.tools.merger = tool;
        self
    }

    /// Tools replaced by the [`FakeToolRunner`] programs.
    pub fn fake_tools(self) -> Self {
        self.converter(FakeToolRunner::converter_template())
            .merger(FakeToolRunner::merger_template())
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Pipeline environment on `fs` driving the fake tools, with a fixed
/// timestamp.
pub fn fake_env(fs: Arc<dyn FileSystem>, runner: &FakeToolRunner) -> PipelineEnv {
    PipelineEnv::new(fs, Arc::new(runner.clone()))
        .with_converter(FakeToolRunner::converter_template())
        .with_merger(FakeToolRunner::merger_template())
        .with_render(RenderSettings::fixed(FIXED_TIMESTAMP, BTreeMap::new()))
}
