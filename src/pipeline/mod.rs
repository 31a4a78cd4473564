// src/pipeline/mod.rs

//! The slide-deck build: split a deck into per-slide documents, stamp and
//! convert each slide, and merge the PDFs back together.
//!
//! - [`paths`] derives every artifact path from the deck parameters.
//! - [`env`] bundles the collaborators (filesystem, document backend,
//!   process runner, tool templates) and render settings.
//! - [`tasks`] defines the [`SlideTask`] steps and their dependencies.

pub mod env;
pub mod paths;
pub mod tasks;

pub use env::{DEFAULT_DATE_FORMAT, PipelineEnv, RenderSettings};
pub use paths::DeckParams;
pub use tasks::{Deck, SlideTask, pipeline};
