// src/document/mod.rs

//! Slide-deck editing collaborator.
//!
//! The pipeline only needs a handful of operations on a deck: count the
//! slides, toggle a slide's visibility, substitute text on one slide and save
//! the result. [`SlideDocument`] captures exactly that, and
//! [`DocumentBackend`] opens documents by path.
//!
//! [`pptx::PptxBackend`] is the production implementation for `.pptx` files.

use std::fmt::Debug;
use std::path::Path;

use crate::errors::Result;

pub mod pptx;

pub use pptx::{PptxBackend, PptxDocument};

/// An opened, editable slide deck.
pub trait SlideDocument: Send + Debug {
    fn slide_count(&self) -> usize;

    /// Mark slide `index` (zero-based, presentation order) as shown or hidden.
    fn set_slide_visible(&mut self, index: usize, visible: bool) -> Result<()>;

    /// Replace every occurrence of `pattern` in the text runs of slide
    /// `index` with `value`. Returns the number of replacements made.
    fn replace_text(&mut self, index: usize, pattern: &str, value: &str) -> Result<usize>;

    /// Serialize the document to `path`.
    fn save(&self, path: &Path) -> Result<()>;
}

/// Opens documents by path.
pub trait DocumentBackend: Send + Sync + Debug {
    fn open(&self, path: &Path) -> Result<Box<dyn SlideDocument>>;
}
