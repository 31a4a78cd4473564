// tests/integration/pipeline_tools.rs

use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use deckbuild::engine::Engine;
use deckbuild::exec::{ExternalInvocation, ProcessRunner, TokioProcessRunner, ToolTemplate};
use deckbuild::fs::RealFileSystem;
use deckbuild::pipeline::{DeckParams, PipelineEnv, RenderSettings, pipeline};
use deckbuild_test_utils::builders::FIXED_TIMESTAMP;
use deckbuild_test_utils::fake_runner::{CONVERT_PROGRAM, MERGE_PROGRAM};
use deckbuild_test_utils::pptx_fixture::write_pptx;

use crate::common::{Workspace, init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn template(program: &str, args: &[&str]) -> ToolTemplate {
    ToolTemplate {
        program: program.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
    }
}

#[tokio::test]
async fn fake_tools_resolve_arguments_against_cwd() -> TestResult {
    let ws = Workspace::with_slides(&["a"]);
    std::fs::write(ws.workdir().join("in.pptx"), b"slide")?;

    let convert = ExternalInvocation::new(CONVERT_PROGRAM, ws.workdir()).args(["in.pptx", "out.pdf"]);
    let out = ws.runner.run_process(&convert).await?;
    assert_eq!(out.exit_code, 0, "{}", out.stderr);
    assert_eq!(ws.read_to_string(&ws.workdir().join("out.pdf")), "page:in.pptx\n");

    let merge = ExternalInvocation::new(MERGE_PROGRAM, ws.workdir()).args(["out.pdf", "out.pdf", "all.pdf"]);
    let out = ws.runner.run_process(&merge).await?;
    assert_eq!(out.exit_code, 0, "{}", out.stderr);
    assert_eq!(
        ws.read_to_string(&ws.workdir().join("all.pdf")),
        "page:in.pptx\npage:in.pptx\n"
    );
    Ok(())
}

#[tokio::test]
async fn tools_addressing_files_by_name_find_them_in_the_workdir() -> TestResult {
    let ws = Workspace::with_slides(&["one", "two"]);
    let env = ws
        .env()
        .with_converter(template(CONVERT_PROGRAM, &["{input_name}", "{output_name}"]));
    let params = ws.params();

    let report = with_timeout(Engine::new(2).run(vec![pipeline(params.clone(), env)])).await?;

    assert!(report.succeeded(), "{report}");
    for inv in ws.runner.invocations_of(CONVERT_PROGRAM) {
        assert_eq!(inv.cwd, ws.workdir());
        assert!(!inv.args[0].contains('/'), "{:?}", inv.args);
    }
    assert_eq!(
        ws.read_to_string(&params.merged_pdf()),
        "page:base_raw_0_processed.pptx\npage:base_raw_1_processed.pptx\n"
    );
    Ok(())
}

/// Build from a workdir given relative to the test's current directory,
/// with real `sh` tools that see that workdir as their cwd.
#[cfg(unix)]
#[tokio::test]
async fn relative_workdir_builds_with_real_tools() -> TestResult {
    init_tracing();
    let cwd = std::env::current_dir()?;
    let dir = tempfile::Builder::new()
        .prefix(".deckbuild-rel-")
        .tempdir_in(&cwd)?;
    let relative: PathBuf = dir.path().strip_prefix(&cwd)?.to_path_buf();
    write_pptx(&dir.path().join("base.pptx"), &["first", "second"])?;

    let params = DeckParams::absolute(relative.join("base.pptx"), &relative)?;
    assert_eq!(params.workdir(), dir.path());

    let env = PipelineEnv::new(Arc::new(RealFileSystem), Arc::new(TokioProcessRunner))
        .with_converter(template("sh", &["-c", r#"cp "$0" "$1""#, "{input_name}", "{output_name}"]))
        .with_merger(template("sh", &["-c", r#"cat "$@" > "$0""#, "{output}", "{inputs}"]))
        .with_render(RenderSettings::fixed(FIXED_TIMESTAMP, BTreeMap::new()));

    let report = with_timeout(Engine::new(2).run(vec![pipeline(params.clone(), env)])).await?;

    assert!(report.succeeded(), "{report}");
    let mut expected = std::fs::read(params.slide_pdf(0))?;
    expected.extend(std::fs::read(params.slide_pdf(1))?);
    assert_eq!(std::fs::read(params.merged_pdf())?, expected);
    assert!(cwd.join(relative.join("base.pdf")).is_file());
    Ok(())
}
