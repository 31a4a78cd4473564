// tests/integration/document_pptx.rs

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use deckbuild::document::{DocumentBackend, PptxBackend, PptxDocument, SlideDocument};
use deckbuild::errors::DeckError;
use deckbuild::fs::FileSystem;
use deckbuild::fs::mock::MockFileSystem;
use deckbuild_test_utils::pptx_fixture::{open_pptx, pptx_bytes, write_pptx};

type TestResult = Result<(), Box<dyn Error>>;

fn mock_with(path: &str, slides: &[&str]) -> Result<(MockFileSystem, PptxBackend), Box<dyn Error>> {
    let fs = MockFileSystem::new();
    fs.add_file(path, pptx_bytes(slides)?);
    let backend = PptxBackend::new(Arc::new(fs.clone()));
    Ok((fs, backend))
}

fn reopen(fs: &MockFileSystem, path: &str) -> Result<PptxDocument, Box<dyn Error>> {
    let bytes = fs.contents(path).ok_or("file missing")?;
    Ok(PptxDocument::from_bytes(
        Path::new(path),
        Arc::new(fs.clone()),
        &bytes,
    )?)
}

#[test]
fn slide_order_follows_the_slide_id_list() -> TestResult {
    let fs: Arc<dyn FileSystem> = Arc::new(MockFileSystem::new());
    let doc = PptxDocument::from_bytes(
        Path::new("deck.pptx"),
        fs,
        &pptx_bytes(&["first", "second", "third"])?,
    )?;

    assert_eq!(doc.slide_count(), 3);
    assert_eq!(
        doc.slide_parts(),
        vec![
            "ppt/slides/slide1.xml",
            "ppt/slides/slide2.xml",
            "ppt/slides/slide3.xml"
        ]
    );
    assert_eq!(doc.slide_text(0)?, "first");
    assert_eq!(doc.slide_text(2)?, "third");
    Ok(())
}

#[test]
fn hiding_and_showing_survives_a_save() -> TestResult {
    let (fs, backend) = mock_with("/d/deck.pptx", &["a", "b"])?;

    let mut doc = backend.open(Path::new("/d/deck.pptx"))?;
    doc.set_slide_visible(0, false)?;
    doc.set_slide_visible(1, false)?;
    doc.set_slide_visible(1, true)?;
    doc.save(Path::new("/d/out.pptx"))?;

    let saved = reopen(&fs, "/d/out.pptx")?;
    assert!(!saved.is_slide_visible(0)?);
    assert!(saved.is_slide_visible(1)?);

    // The opened source is not touched by edits.
    let original = reopen(&fs, "/d/deck.pptx")?;
    assert!(original.is_slide_visible(0)?);
    Ok(())
}

#[test]
fn replace_text_counts_every_occurrence_on_one_slide() -> TestResult {
    let (fs, backend) = mock_with("/d/deck.pptx", &["[date] and [date]", "[date]"])?;

    let mut doc = backend.open(Path::new("/d/deck.pptx"))?;
    assert_eq!(doc.replace_text(0, "[date]", "today")?, 2);
    assert_eq!(doc.replace_text(0, "[date]", "today")?, 0);
    assert_eq!(doc.replace_text(0, "", "x")?, 0);
    doc.save(Path::new("/d/out.pptx"))?;

    let saved = reopen(&fs, "/d/out.pptx")?;
    assert_eq!(saved.slide_text(0)?, "today and today");
    assert_eq!(saved.slide_text(1)?, "[date]");
    Ok(())
}

#[test]
fn replacement_values_are_escaped() -> TestResult {
    let (fs, backend) = mock_with("/d/deck.pptx", &["By [author] <draft>"])?;

    let mut doc = backend.open(Path::new("/d/deck.pptx"))?;
    assert_eq!(doc.replace_text(0, "[author]", "Tom & <Jerry>")?, 1);
    doc.save(Path::new("/d/out.pptx"))?;

    let saved = reopen(&fs, "/d/out.pptx")?;
    assert_eq!(saved.slide_text(0)?, "By Tom & <Jerry> <draft>");
    Ok(())
}

#[test]
fn out_of_range_slide_is_a_document_error() -> TestResult {
    let (_, backend) = mock_with("/d/deck.pptx", &["only"])?;
    let mut doc = backend.open(Path::new("/d/deck.pptx"))?;

    let err = doc.set_slide_visible(1, true).unwrap_err();
    match err {
        DeckError::DocumentFormat { path, message } => {
            assert_eq!(path, Path::new("/d/deck.pptx"));
            assert!(message.contains("out of range"), "{message}");
        }
        other => panic!("expected document error, got {other:?}"),
    }
    assert!(doc.replace_text(5, "a", "b").is_err());
    Ok(())
}

#[test]
fn garbage_and_missing_files_are_document_errors() {
    let fs = MockFileSystem::new();
    fs.add_file("/d/junk.pptx", b"PK? not really".to_vec());
    let backend = PptxBackend::new(Arc::new(fs));

    for path in ["/d/junk.pptx", "/d/absent.pptx"] {
        let err = backend.open(Path::new(path)).unwrap_err();
        assert!(
            matches!(err, DeckError::DocumentFormat { .. }),
            "{path}: {err:?}"
        );
    }
}

#[test]
fn zip_without_presentation_part_is_rejected() -> TestResult {
    use std::io::{Cursor, Write};
    use zip::ZipWriter;
    use zip::write::FileOptions;

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file("hello.txt", FileOptions::default())?;
    writer.write_all(b"hi")?;
    let bytes = writer.finish()?.into_inner();

    let fs: Arc<dyn FileSystem> = Arc::new(MockFileSystem::new());
    let err = PptxDocument::from_bytes(Path::new("x.pptx"), fs, &bytes).unwrap_err();
    assert!(err.to_string().contains("presentation.xml"), "{err}");
    Ok(())
}

#[test]
fn empty_deck_has_no_slides() -> TestResult {
    let (_, backend) = mock_with("/d/empty.pptx", &[])?;
    let doc = backend.open(Path::new("/d/empty.pptx"))?;
    assert_eq!(doc.slide_count(), 0);
    Ok(())
}

#[test]
fn round_trip_on_disk_keeps_untouched_parts() -> TestResult {
    let dir = tempfile::tempdir()?;
    let src = dir.path().join("talk.pptx");
    let dst = dir.path().join("copy.pptx");
    write_pptx(&src, &["x", "y"])?;

    let original = open_pptx(&src)?;
    original.save(&dst)?;
    let copy = open_pptx(&dst)?;

    assert_eq!(copy.slide_parts(), original.slide_parts());
    assert_eq!(copy.slide_text(1)?, "y");
    assert!(copy.is_slide_visible(0)?);
    Ok(())
}
