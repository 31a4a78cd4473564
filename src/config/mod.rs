// src/config/mod.rs

//! Configuration loading and validation for deckbuild.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk, or fall back to defaults (`loader.rs`).
//! - Validate worker counts, date formats and tool templates (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{DEFAULT_CONFIG_FILE, load_and_validate, load_config, load_from_path};
pub use model::{ConfigFile, EngineSection, RawConfigFile, RenderSection, ToolsSection};
