#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use deckbuild::engine::{Engine, PassReport};
use deckbuild::fs::{FileSystem, RealFileSystem};
use deckbuild::pipeline::{DeckParams, PipelineEnv, pipeline};
use deckbuild_test_utils::builders::fake_env;
use deckbuild_test_utils::fake_runner::FakeToolRunner;
use deckbuild_test_utils::pptx_fixture::write_pptx;

pub use deckbuild_test_utils::{init_tracing, with_timeout};

/// A temporary working directory holding `base.pptx`, with the fake tools.
pub struct Workspace {
    pub dir: TempDir,
    pub fs: Arc<dyn FileSystem>,
    pub runner: FakeToolRunner,
}

impl Workspace {
    pub fn with_slides(slides: &[&str]) -> Self {
        init_tracing();
        let dir = tempfile::tempdir().expect("create temp dir");
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let runner = FakeToolRunner::new(Arc::clone(&fs));
        write_pptx(&dir.path().join("base.pptx"), slides).expect("write fixture deck");
        Self { dir, fs, runner }
    }

    pub fn workdir(&self) -> &Path {
        self.dir.path()
    }

    pub fn document(&self) -> PathBuf {
        self.workdir().join("base.pptx")
    }

    pub fn params(&self) -> DeckParams {
        DeckParams::new(self.document(), self.workdir())
    }

    pub fn env(&self) -> PipelineEnv {
        fake_env(Arc::clone(&self.fs), &self.runner)
    }

    /// One full pass over a fresh pipeline root.
    pub async fn build(&self, workers: usize) -> PassReport {
        let root = pipeline(self.params(), self.env());
        with_timeout(Engine::new(workers).run(vec![root]))
            .await
            .expect("pass should resolve")
    }

    pub fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    pub fn read_to_string(&self, path: &Path) -> String {
        std::fs::read_to_string(path).unwrap_or_default()
    }
}
