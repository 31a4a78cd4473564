// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod document;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod target;
pub mod task;
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::load_config;
use crate::dag::{ExecutionGraph, Resolution, resolve};
use crate::engine::Engine;
use crate::exec::TokioProcessRunner;
use crate::fs::RealFileSystem;
use crate::pipeline::{DeckParams, PipelineEnv, pipeline};
use crate::task::Task;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file + CLI overrides)
/// - the pipeline environment (filesystem, pptx backend, external tools)
/// - one engine pass over the pipeline root
///
/// Returns whether the pass succeeded; the report is printed to stdout.
pub async fn run(args: CliArgs) -> Result<bool> {
    if !args.document.is_file() {
        bail!("source document {} does not exist", args.document.display());
    }

    let workdir = args.workdir();
    let mut cfg = load_config(args.config.as_deref(), &workdir)?;
    if let Some(workers) = args.workers {
        cfg.engine.workers = usize::from(workers);
    }
    if let Some(check) = args.completeness {
        cfg.engine.completeness = check;
    }

    let env = PipelineEnv::from_config(&cfg, Arc::new(RealFileSystem), Arc::new(TokioProcessRunner))?;
    let params = DeckParams::absolute(&args.document, &workdir)
        .with_context(|| format!("resolving working directory {}", workdir.display()))?;
    info!(document = ?params.document, workdir = ?params.workdir, workers = cfg.engine.workers, "building deck");

    let root = pipeline(params.clone(), env);

    if args.dry_run {
        let graph = resolve(vec![root])?;
        print_dry_run(&params, cfg.engine.workers, &graph);
        return Ok(!graph
            .node_ids()
            .any(|id| matches!(graph.resolution(id), Resolution::Failed(_))));
    }

    let report = Engine::new(cfg.engine.workers).run(vec![root]).await?;
    println!("{report}");
    Ok(report.succeeded())
}

/// Print the resolved plan: what is up to date and what would run.
fn print_dry_run<T: Task>(params: &DeckParams, workers: usize, graph: &ExecutionGraph<T>) {
    println!("deckbuild dry-run");
    println!("  document = {}", params.document.display());
    println!("  workdir = {}", params.workdir.display());
    println!("  workers = {workers}");
    println!();

    let mut ids: Vec<_> = graph.node_ids().collect();
    ids.sort_by(|a, b| graph.identity(*a).cmp(graph.identity(*b)));

    println!("tasks ({}):", ids.len());
    for id in ids {
        let status = match graph.resolution(id) {
            Resolution::UpToDate(_) => "up to date".to_string(),
            Resolution::Incomplete(_) => "would run".to_string(),
            Resolution::Failed(err) => format!("error: {err}"),
            Resolution::Unresolved => "unresolved".to_string(),
        };
        println!("  - {} [{status}]", graph.identity(id));

        let deps = graph.dependencies_of(id);
        if !deps.is_empty() {
            let names: Vec<String> = deps.iter().map(|&d| graph.identity(d).to_string()).collect();
            println!("      after: {}", names.join(", "));
        }
    }

    debug!("dry-run complete (no execution)");
}
