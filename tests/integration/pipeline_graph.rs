// tests/integration/pipeline_graph.rs

use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use deckbuild::dag::{Resolution, resolve};
use deckbuild::document::{DocumentBackend, PptxBackend, SlideDocument};
use deckbuild::errors::{DeckError, StructuralError};
use deckbuild::fs::FileSystem;
use deckbuild::fs::mock::MockFileSystem;
use deckbuild::pipeline::{DeckParams, SlideTask, pipeline};
use deckbuild::target::TaskOutput;
use deckbuild::task::{Task, TaskIdentity};
use deckbuild_test_utils::builders::fake_env;
use deckbuild_test_utils::fake_runner::FakeToolRunner;
use deckbuild_test_utils::pptx_fixture::pptx_bytes;

type TestResult = Result<(), Box<dyn Error>>;

const DOC: &str = "/decks/talk.pptx";
const WORKDIR: &str = "/build";

fn mock_deck(slides: &[&str]) -> Result<(MockFileSystem, SlideTask), Box<dyn Error>> {
    let fs = MockFileSystem::new();
    fs.add_file(DOC, pptx_bytes(slides)?);
    let shared: Arc<dyn FileSystem> = Arc::new(fs.clone());
    let runner = FakeToolRunner::new(Arc::clone(&shared));
    let root = pipeline(DeckParams::new(DOC, WORKDIR), fake_env(shared, &runner));
    Ok((fs, root))
}

fn id(kind: &str, index: Option<usize>) -> TaskIdentity {
    let base = TaskIdentity::new(kind)
        .with("document", DOC)
        .with("workdir", WORKDIR);
    match index {
        Some(i) => base.with("index", i),
        None => base,
    }
}

#[test]
fn merge_fans_out_over_every_slide() -> TestResult {
    let (_, root) = mock_deck(&["a", "b", "c", "d"])?;

    let graph = resolve(vec![root])?;

    // Pipeline, ExtractSlides, MergeSlides and three steps per slide.
    assert_eq!(graph.len(), 3 + 4 * 3);

    let merge_deps = graph.dependency_identities(&id("MergeSlides", None));
    let expected: Vec<TaskIdentity> = (0..4).map(|i| id("ConvertToPdf", Some(i))).collect();
    assert_eq!(merge_deps.into_iter().cloned().collect::<Vec<_>>(), expected);

    for i in 0..4 {
        assert_eq!(
            graph.dependency_identities(&id("ConvertToPdf", Some(i))),
            vec![&id("PostProcess", Some(i))]
        );
        assert_eq!(
            graph.dependency_identities(&id("PostProcess", Some(i))),
            vec![&id("RenderDate", Some(i))]
        );
        assert_eq!(
            graph.dependency_identities(&id("RenderDate", Some(i))),
            vec![&id("ExtractSlides", None)]
        );
    }

    let extract = graph.lookup(&id("ExtractSlides", None)).ok_or("extract missing")?;
    assert_eq!(graph.dependents_of(extract).len(), 1 + 4);
    Ok(())
}

#[test]
fn extraction_declares_one_artifact_per_slide() -> TestResult {
    let (_, root) = mock_deck(&["a", "b"])?;
    let graph = resolve(vec![root])?;

    let extract = graph.lookup(&id("ExtractSlides", None)).ok_or("extract missing")?;
    match graph.output(extract) {
        Some(TaskOutput::Indexed(targets)) => {
            assert_eq!(targets.len(), 2);
            let paths: Vec<_> = (0..2)
                .map(|i| output_path(graph.output(extract), i))
                .collect();
            assert_eq!(
                paths,
                vec![
                    Some("/build/talk_raw_0.pptx".into()),
                    Some("/build/talk_raw_1.pptx".into())
                ]
            );
        }
        other => panic!("expected indexed output, got {other:?}"),
    }
    Ok(())
}

fn output_path(output: Option<&TaskOutput>, index: usize) -> Option<std::path::PathBuf> {
    output
        .and_then(|o| o.at_index(index))
        .map(|t| t.path().to_path_buf())
}

#[test]
fn existing_slide_pdfs_cut_the_graph_short() -> TestResult {
    let (fs, root) = mock_deck(&["a", "b", "c"])?;
    fs.add_file("/build/talk_raw_0_processed.pdf", b"%PDF".to_vec());
    fs.add_file("/build/talk_raw_2_processed.pdf", b"%PDF".to_vec());

    let graph = resolve(vec![root])?;

    for i in [0, 2] {
        let node = graph.lookup(&id("ConvertToPdf", Some(i))).ok_or("convert missing")?;
        assert!(matches!(graph.resolution(node), Resolution::UpToDate(_)));
        assert!(graph.dependencies_of(node).is_empty());
        assert!(graph.lookup(&id("PostProcess", Some(i))).is_none());
        assert!(graph.lookup(&id("RenderDate", Some(i))).is_none());
    }

    let pending = graph.lookup(&id("ConvertToPdf", Some(1))).ok_or("convert missing")?;
    assert!(matches!(graph.resolution(pending), Resolution::Incomplete(_)));
    assert!(graph.lookup(&id("RenderDate", Some(1))).is_some());
    Ok(())
}

#[test]
fn complete_build_resolves_to_the_root_alone() -> TestResult {
    let (fs, root) = mock_deck(&["a", "b"])?;
    for i in 0..2 {
        fs.add_file(format!("/build/talk_raw_{i}.pptx"), b"pptx".to_vec());
    }
    fs.add_file("/build/talk.pdf", b"%PDF".to_vec());

    let graph = resolve(vec![root])?;

    assert_eq!(graph.len(), 1);
    let only = graph.roots()[0];
    assert!(matches!(graph.resolution(only), Resolution::UpToDate(_)));
    Ok(())
}

#[test]
fn empty_artifacts_count_as_missing_under_non_empty_check() -> TestResult {
    use deckbuild::types::CompletenessCheck;

    let fs = MockFileSystem::new();
    fs.add_file(DOC, pptx_bytes(&["a"])?);
    fs.add_file("/build/talk_raw_0.pptx", b"pptx".to_vec());
    fs.add_file("/build/talk.pdf", Vec::new());
    let shared: Arc<dyn FileSystem> = Arc::new(fs.clone());
    let runner = FakeToolRunner::new(Arc::clone(&shared));
    let env = fake_env(shared, &runner).with_completeness(CompletenessCheck::NonEmpty);
    let root = pipeline(DeckParams::new(DOC, WORKDIR), env);

    let graph = resolve(vec![root])?;

    let merge = graph.lookup(&id("MergeSlides", None)).ok_or("merge missing")?;
    assert!(matches!(graph.resolution(merge), Resolution::Incomplete(_)));
    Ok(())
}

#[test]
fn identities_ignore_where_tasks_were_built() {
    let fs: Arc<dyn FileSystem> = Arc::new(MockFileSystem::new());
    let runner = FakeToolRunner::new(Arc::clone(&fs));
    let a = pipeline(DeckParams::new(DOC, WORKDIR), fake_env(Arc::clone(&fs), &runner));
    let b = pipeline(DeckParams::new(DOC, WORKDIR), fake_env(fs, &runner));

    assert_eq!(a.identity(), b.identity());
    let a_merge = SlideTask::MergeSlides(Arc::clone(a.deck()));
    let b_merge = SlideTask::MergeSlides(Arc::clone(b.deck()));
    assert_eq!(a_merge.identity(), b_merge.identity());
    assert_ne!(a.identity(), a_merge.identity());
}

/// Counts how often the source deck is opened.
#[derive(Debug)]
struct CountingBackend {
    inner: PptxBackend,
    opens: AtomicUsize,
}

impl DocumentBackend for CountingBackend {
    fn open(&self, path: &Path) -> deckbuild::errors::Result<Box<dyn SlideDocument>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.inner.open(path)
    }
}

#[test]
fn slide_count_is_read_once_per_deck() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file(DOC, pptx_bytes(&["a", "b", "c"])?);
    let shared: Arc<dyn FileSystem> = Arc::new(fs);
    let runner = FakeToolRunner::new(Arc::clone(&shared));
    let backend = Arc::new(CountingBackend {
        inner: PptxBackend::new(Arc::clone(&shared)),
        opens: AtomicUsize::new(0),
    });
    let env = fake_env(shared, &runner).with_documents(Arc::clone(&backend) as Arc<dyn DocumentBackend>);

    let graph = resolve(vec![pipeline(DeckParams::new(DOC, WORKDIR), env)])?;

    assert_eq!(graph.len(), 3 + 3 * 3);
    assert_eq!(backend.opens.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn output_over_another_decks_source_is_a_collision() -> TestResult {
    let fs = MockFileSystem::new();
    // Deck B merges into /w/b.pdf, which deck A reads as its source.
    fs.add_file("/src/b.pptx", pptx_bytes(&["b"])?);
    fs.add_file("/w/b.pdf", pptx_bytes(&["a"])?);
    let shared: Arc<dyn FileSystem> = Arc::new(fs);
    let runner = FakeToolRunner::new(Arc::clone(&shared));
    let deck_a = pipeline(
        DeckParams::new("/w/b.pdf", "/out"),
        fake_env(Arc::clone(&shared), &runner),
    );
    let deck_b = pipeline(DeckParams::new("/src/b.pptx", "/w"), fake_env(shared, &runner));

    for roots in [vec![deck_a.clone(), deck_b.clone()], vec![deck_b, deck_a]] {
        match resolve(roots) {
            Err(DeckError::Structural(StructuralError::PathCollision { path, first, second })) => {
                assert_eq!(path, Path::new("/w/b.pdf"));
                let kinds = [first.kind.as_str(), second.kind.as_str()];
                assert!(kinds.contains(&"MergeSlides"), "{kinds:?}");
                assert!(kinds.contains(&"ExtractSlides"), "{kinds:?}");
            }
            Err(other) => panic!("expected a path collision, got {other:?}"),
            Ok(_) => panic!("expected a path collision"),
        }
    }
    Ok(())
}

#[test]
fn decks_sharing_a_source_do_not_collide() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file(DOC, pptx_bytes(&["a"])?);
    let shared: Arc<dyn FileSystem> = Arc::new(fs);
    let runner = FakeToolRunner::new(Arc::clone(&shared));
    let one = pipeline(DeckParams::new(DOC, "/one"), fake_env(Arc::clone(&shared), &runner));
    let two = pipeline(DeckParams::new(DOC, "/two"), fake_env(shared, &runner));

    let graph = resolve(vec![one, two])?;

    assert_eq!(graph.roots().len(), 2);
    Ok(())
}
