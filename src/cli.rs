// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::CompletenessCheck;

/// Command-line arguments for `deckbuild`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "deckbuild",
    version,
    about = "Build a PDF from a slide deck, one slide at a time, reusing finished artifacts.",
    long_about = None
)]
pub struct CliArgs {
    /// Source slide deck (`.pptx`).
    #[arg(value_name = "DOCUMENT")]
    pub document: PathBuf,

    /// Directory for intermediate and final artifacts.
    ///
    /// Default: the directory containing DOCUMENT.
    #[arg(long, value_name = "DIR")]
    pub workdir: Option<PathBuf>,

    /// Maximum number of tasks running at once (overrides the config file).
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Deckbuild.toml` in the working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// When an artifact counts as present: `exists` or `non-empty`
    /// (overrides the config file).
    #[arg(long, value_name = "CHECK")]
    pub completeness: Option<CompletenessCheck>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DECKBUILD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve the task graph and print which tasks would run, without
    /// running anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// Working directory for this run, as given. [`crate::run`] makes it
    /// absolute before any task sees it.
    pub fn workdir(&self) -> PathBuf {
        match (&self.workdir, self.document.parent()) {
            (Some(dir), _) => dir.clone(),
            (None, Some(parent)) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
