// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile, ToolsSection};
use crate::errors::{DeckError, Result};
use crate::exec::ToolTemplate;
use crate::pipeline::env::is_valid_date_format;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::DeckError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.engine, raw.render, raw.tools))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_engine(cfg)?;
    validate_render(cfg)?;
    validate_tools(&cfg.tools)?;
    Ok(())
}

fn validate_engine(cfg: &RawConfigFile) -> Result<()> {
    if cfg.engine.workers == 0 {
        return Err(DeckError::Config(
            "[engine].workers must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_render(cfg: &RawConfigFile) -> Result<()> {
    if !is_valid_date_format(&cfg.render.date_format) {
        return Err(DeckError::Config(format!(
            "[render].date_format {:?} is not a valid date format",
            cfg.render.date_format
        )));
    }

    for name in cfg.render.replacements.keys() {
        if name.is_empty() || name.contains(['[', ']']) || name == "date" {
            return Err(DeckError::Config(format!(
                "[render.replacements] has invalid placeholder name {name:?}"
            )));
        }
    }

    Ok(())
}

fn validate_tools(tools: &ToolsSection) -> Result<()> {
    ensure_program("converter", &tools.converter)?;
    ensure_program("merger", &tools.merger)?;

    for placeholder in ["{inputs}", "{output}"] {
        if !tools.merger.mentions(placeholder) {
            return Err(DeckError::Config(format!(
                "[tools.merger].args must contain {placeholder}"
            )));
        }
    }

    if !tools.merger.args.iter().any(|a| a == "{inputs}") {
        return Err(DeckError::Config(
            "[tools.merger].args must use {inputs} as a whole argument".to_string(),
        ));
    }

    Ok(())
}

fn ensure_program(name: &str, tool: &ToolTemplate) -> Result<()> {
    if tool.program.trim().is_empty() {
        return Err(DeckError::Config(format!(
            "[tools.{name}].program must not be empty"
        )));
    }
    Ok(())
}
