// src/pipeline/tasks.rs

//! The deck build expressed as [`Task`]s.
//!
//! ```text
//! Pipeline ──► ExtractSlides
//!    └───────► MergeSlides ──► ConvertToPdf(i) ──► PostProcess(i) ──► RenderDate(i) ──► ExtractSlides
//! ```
//!
//! `MergeSlides` fans out over the slides of the *source* document, so its
//! dependencies are known before any per-slide artifact exists.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use anyhow::anyhow;
use tracing::{debug, info, warn};

use crate::document::SlideDocument;
use crate::errors::{DeckError, Result};
use crate::exec::{ToolVars, invoke};
use crate::fs::{discard, partial_path, publish};
use crate::pipeline::env::PipelineEnv;
use crate::pipeline::paths::DeckParams;
use crate::target::TaskOutput;
use crate::task::{RunFuture, Task, TaskIdentity};

/// One deck build: its parameters, its collaborators and the slide count
/// of the source document once it has been read.
#[derive(Debug)]
pub struct Deck {
    params: DeckParams,
    env: PipelineEnv,
    slide_count: OnceLock<usize>,
}

impl Deck {
    pub fn new(params: DeckParams, env: PipelineEnv) -> Arc<Self> {
        Arc::new(Self {
            params,
            env,
            slide_count: OnceLock::new(),
        })
    }

    pub fn params(&self) -> &DeckParams {
        &self.params
    }

    pub fn env(&self) -> &PipelineEnv {
        &self.env
    }

    /// Number of slides in the source document. Read once per deck.
    pub fn slide_count(&self) -> Result<usize> {
        if let Some(&n) = self.slide_count.get() {
            return Ok(n);
        }
        let n = self.env.documents.open(self.params.document())?.slide_count();
        debug!(document = ?self.params.document(), slides = n, "counted slides");
        Ok(*self.slide_count.get_or_init(|| n))
    }
}

/// Closed set of pipeline steps.
#[derive(Debug, Clone)]
pub enum SlideTask {
    /// Root: wraps `ExtractSlides` and `MergeSlides`.
    Pipeline(Arc<Deck>),
    /// Writes one copy of the deck per slide with only that slide shown.
    ExtractSlides(Arc<Deck>),
    /// Substitutes `[date]` and the configured placeholders on slide `i`.
    RenderDate(Arc<Deck>, usize),
    /// Re-saves the dated copy of slide `i`.
    PostProcess(Arc<Deck>, usize),
    /// Runs the external converter on slide `i`.
    ConvertToPdf(Arc<Deck>, usize),
    /// Runs the external merger over every slide PDF.
    MergeSlides(Arc<Deck>),
}

/// Root task of a deck build.
pub fn pipeline(params: DeckParams, env: PipelineEnv) -> SlideTask {
    SlideTask::Pipeline(Deck::new(params, env))
}

impl SlideTask {
    pub fn kind(&self) -> &'static str {
        match self {
            SlideTask::Pipeline(_) => "Pipeline",
            SlideTask::ExtractSlides(_) => "ExtractSlides",
            SlideTask::RenderDate(..) => "RenderDate",
            SlideTask::PostProcess(..) => "PostProcess",
            SlideTask::ConvertToPdf(..) => "ConvertToPdf",
            SlideTask::MergeSlides(_) => "MergeSlides",
        }
    }

    pub fn deck(&self) -> &Arc<Deck> {
        match self {
            SlideTask::Pipeline(deck)
            | SlideTask::ExtractSlides(deck)
            | SlideTask::RenderDate(deck, _)
            | SlideTask::PostProcess(deck, _)
            | SlideTask::ConvertToPdf(deck, _)
            | SlideTask::MergeSlides(deck) => deck,
        }
    }

    /// Slide index for per-slide steps.
    pub fn slide(&self) -> Option<usize> {
        match self {
            SlideTask::RenderDate(_, i) | SlideTask::PostProcess(_, i) | SlideTask::ConvertToPdf(_, i) => {
                Some(*i)
            }
            _ => None,
        }
    }

    fn single(&self, path: PathBuf) -> TaskOutput {
        TaskOutput::Single(self.deck().env.target(path))
    }
}

impl Task for SlideTask {
    fn identity(&self) -> TaskIdentity {
        let params = self.deck().params();
        let identity = TaskIdentity::new(self.kind())
            .with("document", params.document().display())
            .with("workdir", params.workdir().display());

        match self.slide() {
            Some(i) => identity.with("index", i),
            None => identity,
        }
    }

    fn output(&self) -> Result<TaskOutput> {
        let deck = self.deck();
        let params = deck.params();

        Ok(match self {
            SlideTask::Pipeline(deck) => TaskOutput::Aggregate(vec![
                SlideTask::ExtractSlides(Arc::clone(deck)).output()?,
                SlideTask::MergeSlides(Arc::clone(deck)).output()?,
            ]),
            SlideTask::ExtractSlides(deck) => TaskOutput::Indexed(
                (0..deck.slide_count()?)
                    .map(|i| (i, deck.env.target(params.raw_slide(i))))
                    .collect(),
            ),
            SlideTask::RenderDate(_, i) => self.single(params.dated_slide(*i)),
            SlideTask::PostProcess(_, i) => self.single(params.processed_slide(*i)),
            SlideTask::ConvertToPdf(_, i) => self.single(params.slide_pdf(*i)),
            SlideTask::MergeSlides(_) => self.single(params.merged_pdf()),
        })
    }

    fn dependencies(&self) -> Result<Vec<Self>> {
        Ok(match self {
            SlideTask::Pipeline(deck) => vec![
                SlideTask::ExtractSlides(Arc::clone(deck)),
                SlideTask::MergeSlides(Arc::clone(deck)),
            ],
            SlideTask::ExtractSlides(_) => Vec::new(),
            SlideTask::RenderDate(deck, _) => vec![SlideTask::ExtractSlides(Arc::clone(deck))],
            SlideTask::PostProcess(deck, i) => vec![SlideTask::RenderDate(Arc::clone(deck), *i)],
            SlideTask::ConvertToPdf(deck, i) => vec![SlideTask::PostProcess(Arc::clone(deck), *i)],
            SlideTask::MergeSlides(deck) => (0..deck.slide_count()?)
                .map(|i| SlideTask::ConvertToPdf(Arc::clone(deck), i))
                .collect(),
        })
    }

    fn inputs(&self) -> Vec<PathBuf> {
        match self {
            SlideTask::ExtractSlides(deck) | SlideTask::MergeSlides(deck) => {
                vec![deck.params().document().to_path_buf()]
            }
            _ => Vec::new(),
        }
    }

    fn run<'a>(&'a self, deps: &'a [Arc<Self>]) -> RunFuture<'a> {
        Box::pin(async move {
            match self {
                // Nothing to produce: the wrapped outputs belong to the deps.
                SlideTask::Pipeline(_) => Ok(()),
                SlideTask::ExtractSlides(deck) => {
                    let deck = Arc::clone(deck);
                    blocking(move || extract_slides(&deck)).await
                }
                SlideTask::RenderDate(deck, i) => {
                    let (deck, i) = (Arc::clone(deck), *i);
                    blocking(move || render_date(&deck, i)).await
                }
                SlideTask::PostProcess(deck, i) => {
                    let (deck, i) = (Arc::clone(deck), *i);
                    blocking(move || post_process(&deck, i)).await
                }
                SlideTask::ConvertToPdf(deck, i) => convert_to_pdf(deck, *i).await,
                SlideTask::MergeSlides(deck) => merge_slides(deck, deps).await,
            }
        })
    }
}

/// Run synchronous document work off the async workers.
async fn blocking<F>(work: F) -> Result<()>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| DeckError::Other(anyhow!("document step panicked: {e}")))?
}

/// Save `doc` next to `dest` and move it into place.
fn save_published(deck: &Deck, doc: &dyn SlideDocument, dest: &Path) -> Result<()> {
    let fs = deck.env.fs.as_ref();
    let staged = partial_path(dest);

    if let Err(err) = doc.save(&staged) {
        if let Err(cleanup) = discard(fs, &staged) {
            warn!(path = ?staged, error = %cleanup, "could not remove partial file");
        }
        return Err(err);
    }

    publish(fs, &staged, dest)?;
    Ok(())
}

fn extract_slides(deck: &Deck) -> Result<()> {
    let params = deck.params();
    let mut doc = deck.env.documents.open(params.document())?;
    let n = doc.slide_count();

    deck.env.fs.create_dir_all(params.workdir())?;

    for i in 0..n {
        doc.set_slide_visible(i, false)?;
    }

    for i in 0..n {
        doc.set_slide_visible(i, true)?;
        save_published(deck, doc.as_ref(), &params.raw_slide(i))?;
        doc.set_slide_visible(i, false)?;
    }

    info!(document = ?params.document(), slides = n, "extracted slides");
    Ok(())
}

fn render_date(deck: &Deck, index: usize) -> Result<()> {
    let params = deck.params();
    let mut doc = deck.env.documents.open(&params.raw_slide(index))?;

    for (pattern, value) in deck.env.render.substitutions() {
        let replaced = doc.replace_text(index, &pattern, &value)?;
        if replaced > 0 {
            debug!(slide = index, %pattern, replaced, "substituted placeholder");
        }
    }

    save_published(deck, doc.as_ref(), &params.dated_slide(index))
}

fn post_process(deck: &Deck, index: usize) -> Result<()> {
    let params = deck.params();
    let doc = deck.env.documents.open(&params.dated_slide(index))?;
    save_published(deck, doc.as_ref(), &params.processed_slide(index))
}

async fn convert_to_pdf(deck: &Deck, index: usize) -> Result<()> {
    let params = deck.params();
    let input = params.processed_slide(index);
    let output = params.slide_pdf(index);

    let invocation = deck.env.converter.render(&ToolVars {
        workdir: params.workdir(),
        input: Some(&input),
        output: Some(&output),
        ..Default::default()
    });

    if let Err(err) = invoke(deck.env.runner.as_ref(), &invocation).await {
        // The converter writes straight to the output path.
        if let Err(cleanup) = discard(deck.env.fs.as_ref(), &output) {
            warn!(path = ?output, error = %cleanup, "could not remove partial PDF");
        }
        return Err(err);
    }

    Ok(())
}

async fn merge_slides(deck: &Deck, deps: &[Arc<SlideTask>]) -> Result<()> {
    let params = deck.params();

    let mut slides: Vec<(usize, PathBuf)> = deps
        .iter()
        .filter_map(|dep| match dep.as_ref() {
            SlideTask::ConvertToPdf(_, i) => Some((*i, params.slide_pdf(*i))),
            _ => None,
        })
        .collect();
    slides.sort_by_key(|(i, _)| *i);

    if slides.is_empty() {
        return Err(DeckError::document(params.document(), "document has no slides to merge"));
    }

    let inputs: Vec<PathBuf> = slides.into_iter().map(|(_, path)| path).collect();
    let dest = params.merged_pdf();
    let staged = partial_path(&dest);

    let invocation = deck.env.merger.render(&ToolVars {
        workdir: params.workdir(),
        input: None,
        inputs: &inputs,
        output: Some(&staged),
    });

    let fs = deck.env.fs.as_ref();
    if let Err(err) = invoke(deck.env.runner.as_ref(), &invocation).await {
        if let Err(cleanup) = discard(fs, &staged) {
            warn!(path = ?staged, error = %cleanup, "could not remove partial merge output");
        }
        return Err(err);
    }

    publish(fs, &staged, &dest)?;
    info!(output = ?dest, pages = inputs.len(), "merged slides");
    Ok(())
}
