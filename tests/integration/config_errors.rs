// tests/integration/config_errors.rs

use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::{TempDir, tempdir};

use deckbuild::config::{DEFAULT_CONFIG_FILE, load_and_validate, load_config, load_from_path};
use deckbuild::errors::DeckError;
use deckbuild::exec::{ToolTemplate, ToolVars};
use deckbuild::fs::{FileSystem, RealFileSystem};
use deckbuild::pipeline::{DEFAULT_DATE_FORMAT, PipelineEnv};
use deckbuild::types::CompletenessCheck;
use deckbuild_test_utils::builders::ConfigFileBuilder;
use deckbuild_test_utils::fake_runner::FakeToolRunner;

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(contents: &str) -> Result<TempDir, Box<dyn Error>> {
    let dir = tempdir()?;
    std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), contents)?;
    Ok(dir)
}

fn config_error(path: &Path) -> String {
    match load_and_validate(path) {
        Err(DeckError::Config(message)) => message,
        Err(other) => panic!("expected a config error, got {other:?}"),
        Ok(cfg) => panic!("expected a config error, got {cfg:?}"),
    }
}

#[test]
fn zero_workers_is_rejected() -> TestResult {
    let dir = write_config("[engine]\nworkers = 0\n")?;
    let message = config_error(&dir.path().join(DEFAULT_CONFIG_FILE));
    assert!(message.contains("workers"), "{message}");
    Ok(())
}

#[test]
fn merger_without_inputs_is_rejected() -> TestResult {
    let dir = write_config(
        r#"
[tools.merger]
program = "pdfunite"
args = ["{output}"]
"#,
    )?;
    let message = config_error(&dir.path().join(DEFAULT_CONFIG_FILE));
    assert!(message.contains("{inputs}"), "{message}");
    Ok(())
}

#[test]
fn inputs_glued_to_other_text_is_rejected() -> TestResult {
    let dir = write_config(
        r#"
[tools.merger]
program = "merge"
args = ["--files={inputs}", "{output}"]
"#,
    )?;
    let message = config_error(&dir.path().join(DEFAULT_CONFIG_FILE));
    assert!(message.contains("whole argument"), "{message}");
    Ok(())
}

#[test]
fn empty_converter_program_is_rejected() -> TestResult {
    let dir = write_config("[tools.converter]\nprogram = \"  \"\n")?;
    let message = config_error(&dir.path().join(DEFAULT_CONFIG_FILE));
    assert!(message.contains("converter"), "{message}");
    Ok(())
}

#[test]
fn bad_date_format_is_rejected() -> TestResult {
    let dir = write_config("[render]\ndate_format = \"%Y-%Q\"\n")?;
    let message = config_error(&dir.path().join(DEFAULT_CONFIG_FILE));
    assert!(message.contains("date_format"), "{message}");
    Ok(())
}

#[test]
fn reserved_placeholder_names_are_rejected() {
    for name in ["date", "", "[x]"] {
        let err = ConfigFileBuilder::new()
            .replacement(name, "value")
            .try_build()
            .unwrap_err();
        assert!(matches!(err, DeckError::Config(_)), "{name:?}: {err:?}");
    }
}

#[test]
fn unknown_keys_are_parse_errors() -> TestResult {
    let dir = write_config("[engine]\nworkers = 2\nthreads = 4\n")?;
    let err = load_from_path(dir.path().join(DEFAULT_CONFIG_FILE)).unwrap_err();
    assert!(matches!(err, DeckError::Toml(_)), "{err:?}");

    let dir = write_config("[watch]\ndebounce = 1\n")?;
    let err = load_from_path(dir.path().join(DEFAULT_CONFIG_FILE)).unwrap_err();
    assert!(matches!(err, DeckError::Toml(_)), "{err:?}");
    Ok(())
}

#[test]
fn missing_default_file_falls_back_to_defaults() -> TestResult {
    let dir = tempdir()?;

    let cfg = load_config(None, dir.path())?;

    assert_eq!(cfg.engine.workers, deckbuild::engine::DEFAULT_WORKERS);
    assert_eq!(cfg.engine.completeness, CompletenessCheck::Exists);
    assert_eq!(cfg.render.date_format, DEFAULT_DATE_FORMAT);
    assert!(cfg.render.replacements.is_empty());
    assert_eq!(cfg.tools.converter, ToolTemplate::default_converter());
    assert_eq!(cfg.tools.merger, ToolTemplate::default_merger());
    Ok(())
}

#[test]
fn explicitly_named_missing_file_is_an_error() -> TestResult {
    let dir = tempdir()?;
    let missing = dir.path().join("nope.toml");

    let err = load_config(Some(&missing), dir.path()).unwrap_err();

    match err {
        DeckError::Config(message) => assert!(message.contains("nope.toml"), "{message}"),
        other => panic!("expected config error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn file_in_search_dir_is_picked_up() -> TestResult {
    let dir = write_config(
        r#"
[engine]
workers = 3
completeness = "non-empty"

[render]
date_format = "%Y-%m-%d"

[render.replacements]
title = "Pipelines"

[tools.converter]
program = "soffice"
args = ["--headless", "--convert-to", "pdf", "--outdir", "{workdir}", "{input}"]

[tools.merger]
program = "qpdf"
args = ["--empty", "--pages", "{inputs}", "--", "{output}"]
"#,
    )?;

    let cfg = load_config(None, dir.path())?;

    assert_eq!(cfg.engine.workers, 3);
    assert_eq!(cfg.engine.completeness, CompletenessCheck::NonEmpty);
    assert_eq!(cfg.render.date_format, "%Y-%m-%d");
    assert_eq!(
        cfg.render.replacements,
        BTreeMap::from([("title".to_string(), "Pipelines".to_string())])
    );
    assert_eq!(cfg.tools.converter.program, "soffice");

    let inputs: Vec<PathBuf> = vec!["/w/a.pdf".into(), "/w/b.pdf".into()];
    let merge = cfg.tools.merger.render(&ToolVars {
        workdir: Path::new("/w"),
        inputs: &inputs,
        output: Some(Path::new("/w/deck.pdf")),
        ..Default::default()
    });
    assert_eq!(
        merge.args,
        vec!["--empty", "--pages", "/w/a.pdf", "/w/b.pdf", "--", "/w/deck.pdf"]
    );

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let runner = FakeToolRunner::new(Arc::clone(&fs));
    let env = PipelineEnv::from_config(&cfg, fs, Arc::new(runner))?;
    assert_eq!(env.completeness, CompletenessCheck::NonEmpty);
    let substitutions = env.render.substitutions();
    assert_eq!(substitutions[0].0, "[date]");
    assert_eq!(substitutions[0].1.len(), "2030-01-01".len());
    assert_eq!(
        substitutions[1],
        ("[title]".to_string(), "Pipelines".to_string())
    );
    Ok(())
}

#[test]
fn partial_sections_keep_their_defaults() -> TestResult {
    let dir = write_config("[engine]\nworkers = 2\n")?;

    let cfg = load_config(None, dir.path())?;

    assert_eq!(cfg.engine.workers, 2);
    assert_eq!(cfg.engine.completeness, CompletenessCheck::Exists);
    assert_eq!(cfg.tools.merger, ToolTemplate::default_merger());
    Ok(())
}
