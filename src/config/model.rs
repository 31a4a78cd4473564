// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::engine::DEFAULT_WORKERS;
use crate::exec::ToolTemplate;
use crate::pipeline::DEFAULT_DATE_FORMAT;
use crate::types::CompletenessCheck;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [engine]
/// workers = 6
/// completeness = "exists"
///
/// [render]
/// date_format = "%d, %b %Y %H:%M:%S %p"
///
/// [render.replacements]
/// title = "Pipelines"
/// author = "Ada Lovelace"
///
/// [tools.converter]
/// program = "docker"
/// args = ["run", "--rm", "-v", "{workdir}:/data", "..."]
///
/// [tools.merger]
/// program = "pdfunite"
/// args = ["{inputs}", "{output}"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub engine: EngineSection,

    #[serde(default)]
    pub render: RenderSection,

    #[serde(default)]
    pub tools: ToolsSection,
}

/// Validated configuration; build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub engine: EngineSection,
    pub render: RenderSection,
    pub tools: ToolsSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(engine: EngineSection, render: RenderSection, tools: ToolsSection) -> Self {
        Self {
            engine,
            render,
            tools,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        let raw = RawConfigFile::default();
        Self::new_unchecked(raw.engine, raw.render, raw.tools)
    }
}

/// `[engine]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    /// Maximum number of tasks running at once.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// When an artifact counts as present.
    #[serde(default)]
    pub completeness: CompletenessCheck,
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            completeness: CompletenessCheck::default(),
        }
    }
}

/// `[render]` section: what `RenderDate` writes into the slides.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderSection {
    /// chrono strftime format for the `[date]` placeholder.
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Extra placeholders; the key `title` replaces `[title]`.
    #[serde(default)]
    pub replacements: BTreeMap<String, String>,
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
            replacements: BTreeMap::new(),
        }
    }
}

/// `[tools]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsSection {
    /// Per-slide document to PDF conversion.
    #[serde(default = "ToolTemplate::default_converter")]
    pub converter: ToolTemplate,

    /// Merge of all slide PDFs into the final deck.
    #[serde(default = "ToolTemplate::default_merger")]
    pub merger: ToolTemplate,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            converter: ToolTemplate::default_converter(),
            merger: ToolTemplate::default_merger(),
        }
    }
}
