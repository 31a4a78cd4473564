//! Minimal `.pptx` files for tests.
//!
//! The decks contain just the parts the pptx backend reads: content types,
//! the presentation part with its slide id list, the presentation
//! relationships and one slide part per slide with a single text run.

use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use deckbuild::document::PptxDocument;
use deckbuild::fs::{FileSystem, RealFileSystem};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const NS: &str = concat!(
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#
);

/// Bytes of a deck with one slide per entry of `slides`, each holding that
/// text. Relationships are listed in reverse so slide order has to come from
/// the slide id list.
pub fn pptx_bytes(slides: &[&str]) -> Result<Vec<u8>> {
    let mut parts: Vec<(String, String)> = Vec::new();

    parts.push(("[Content_Types].xml".to_string(), content_types(slides.len())));
    parts.push((
        "_rels/.rels".to_string(),
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>"#,
            r#"</Relationships>"#
        )
        .to_string(),
    ));
    parts.push(("ppt/presentation.xml".to_string(), presentation(slides.len())));
    parts.push((
        "ppt/_rels/presentation.xml.rels".to_string(),
        presentation_rels(slides.len()),
    ));
    for (i, text) in slides.iter().enumerate() {
        parts.push((format!("ppt/slides/slide{}.xml", i + 1), slide(text)));
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, xml) in parts {
        writer.start_file(name, options)?;
        writer.write_all(xml.as_bytes())?;
    }
    Ok(writer.finish()?.into_inner())
}

/// Write a deck to `path` on the real filesystem.
pub fn write_pptx(path: &Path, slides: &[&str]) -> Result<()> {
    RealFileSystem.write(path, &pptx_bytes(slides)?)
}

/// Open a deck from the real filesystem for inspection.
pub fn open_pptx(path: &Path) -> Result<PptxDocument> {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let bytes = fs.read(path)?;
    Ok(PptxDocument::from_bytes(path, fs, &bytes)?)
}

fn content_types(n: usize) -> String {
    let mut xml = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
        r#"<Default Extension="xml" ContentType="application/xml"/>"#,
        r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>"#
    ));
    for i in 1..=n {
        xml.push_str(&format!(
            r#"<Override PartName="/ppt/slides/slide{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn presentation(n: usize) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation {NS}>"#
    );
    if n > 0 {
        xml.push_str("<p:sldIdLst>");
        for i in 0..n {
            xml.push_str(&format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 2));
        }
        xml.push_str("</p:sldIdLst>");
    }
    xml.push_str(r#"<p:sldSz cx="9144000" cy="6858000"/></p:presentation>"#);
    xml
}

fn presentation_rels(n: usize) -> String {
    let mut xml = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#
    ));
    for i in (0..n).rev() {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{}.xml"/>"#,
            i + 2,
            i + 1
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn slide(text: &str) -> String {
    let escaped = text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<p:sld {ns}><p:cSld><p:spTree><p:sp><p:txBody><a:bodyPr/><a:p><a:r><a:rPr lang="en-US"/>"#,
            r#"<a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#
        ),
        ns = NS,
        text = escaped
    )
}
