// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DeckError, Result};

/// Name of the config file looked up when none is given explicitly.
pub const DEFAULT_CONFIG_FILE: &str = "Deckbuild.toml";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        DeckError::Config(format!("cannot read config file {}: {e}", path.display()))
    })?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the configuration for a run.
///
/// - An explicitly named file must exist.
/// - Otherwise `Deckbuild.toml` in `search_dir` is used when present, and
///   the built-in defaults when it is not.
pub fn load_config(explicit: Option<&Path>, search_dir: &Path) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        return load_and_validate(path);
    }

    let default_path = default_config_path(search_dir);
    if default_path.is_file() {
        debug!(path = ?default_path, "using config file");
        load_and_validate(&default_path)
    } else {
        debug!(path = ?default_path, "no config file; using defaults");
        Ok(ConfigFile::default())
    }
}

/// Default config location inside `dir`.
pub fn default_config_path(dir: &Path) -> PathBuf {
    dir.join(DEFAULT_CONFIG_FILE)
}
