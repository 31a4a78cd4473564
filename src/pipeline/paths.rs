// src/pipeline/paths.rs

//! Deterministic artifact paths.
//!
//! Every artifact lives in the working directory and is named after the
//! source document's stem, so distinct (document, step, slide) triples never
//! share a path:
//!
//! ```text
//! <stem>_raw_<i>.pptx             ExtractSlides
//! <stem>_raw_<i>_wdate.pptx       RenderDate(i)
//! <stem>_raw_<i>_processed.pptx   PostProcess(i)
//! <stem>_raw_<i>_processed.pdf    ConvertToPdf(i)
//! <stem>.pdf                      MergeSlides
//! ```

use std::path::{self, Path, PathBuf};

use crate::errors::Result;

/// Parameters shared by every task of one deck build.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeckParams {
    pub document: PathBuf,
    pub workdir: PathBuf,
}

impl DeckParams {
    pub fn new(document: impl Into<PathBuf>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            document: document.into(),
            workdir: workdir.into(),
        }
    }

    /// Like [`new`](Self::new), but with both paths made absolute against
    /// the current directory.
    ///
    /// Tools run with the working directory as their cwd, so a relative
    /// artifact path would be resolved twice.
    pub fn absolute(document: impl AsRef<Path>, workdir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(
            path::absolute(document.as_ref())?,
            path::absolute(workdir.as_ref())?,
        ))
    }

    /// File stem of the source document (`base` for `slides/base.pptx`).
    pub fn stem(&self) -> String {
        self.document
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "deck".to_string())
    }

    pub fn document(&self) -> &Path {
        &self.document
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Copy of the deck with only slide `index` shown.
    pub fn raw_slide(&self, index: usize) -> PathBuf {
        self.artifact(format!("{}_raw_{index}.pptx", self.stem()))
    }

    pub fn dated_slide(&self, index: usize) -> PathBuf {
        self.artifact(format!("{}_raw_{index}_wdate.pptx", self.stem()))
    }

    pub fn processed_slide(&self, index: usize) -> PathBuf {
        self.artifact(format!("{}_raw_{index}_processed.pptx", self.stem()))
    }

    pub fn slide_pdf(&self, index: usize) -> PathBuf {
        self.artifact(format!("{}_raw_{index}_processed.pdf", self.stem()))
    }

    pub fn merged_pdf(&self) -> PathBuf {
        self.artifact(format!("{}.pdf", self.stem()))
    }

    fn artifact(&self, name: String) -> PathBuf {
        self.workdir.join(name)
    }
}
