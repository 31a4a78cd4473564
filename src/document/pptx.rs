// src/document/pptx.rs

//! `.pptx` support on top of the OOXML zip container.
//!
//! Only the parts the pipeline touches are interpreted:
//! - `ppt/presentation.xml` (`<p:sldIdLst>`) gives the slide order as
//!   relationship ids,
//! - `ppt/_rels/presentation.xml.rels` maps those ids to slide parts,
//! - each slide part's `<p:sld>` root carries the `show` flag, and its
//!   `<a:t>` runs carry the text.
//!
//! Every other part is copied through untouched and in its original order.

use std::collections::HashMap;
use std::fmt;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::{Captures, Regex};
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::document::{DocumentBackend, SlideDocument};
use crate::errors::{DeckError, Result};
use crate::fs::FileSystem;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PART: &str = "ppt/_rels/presentation.xml.rels";

struct Patterns {
    slide_id_list: Regex,
    slide_id: Regex,
    relationship: Regex,
    attribute: Regex,
    slide_root: Regex,
    show_attr: Regex,
    text_run: Regex,
}

impl Patterns {
    fn compile() -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            slide_id_list: Regex::new(r"(?s)<p:sldIdLst>(.*?)</p:sldIdLst>")?,
            slide_id: Regex::new(r"<p:sldId\s[^>]*>")?,
            relationship: Regex::new(r"<Relationship\s[^>]*>")?,
            attribute: Regex::new(r#"([\w:]+)="([^"]*)""#)?,
            slide_root: Regex::new(r"<p:sld(?:\s[^>]*)?>")?,
            show_attr: Regex::new(r#"\sshow="[^"]*""#)?,
            text_run: Regex::new(r"(<a:t(?:\s[^>]*)?>)([^<]*)(</a:t>)")?,
        })
    }
}

static PATTERNS: LazyLock<std::result::Result<Patterns, regex::Error>> =
    LazyLock::new(Patterns::compile);

fn patterns() -> Result<&'static Patterns> {
    PATTERNS
        .as_ref()
        .map_err(|e| DeckError::Other(anyhow::anyhow!("invalid pptx pattern: {e}")))
}

/// Opens `.pptx` files through a [`FileSystem`].
#[derive(Debug, Clone)]
pub struct PptxBackend {
    fs: Arc<dyn FileSystem>,
}

impl PptxBackend {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl DocumentBackend for PptxBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn SlideDocument>> {
        let bytes = self
            .fs
            .read(path)
            .map_err(|e| DeckError::document(path, format!("cannot read document: {e:#}")))?;
        let doc = PptxDocument::from_bytes(path, Arc::clone(&self.fs), &bytes)?;
        debug!(path = ?path, slides = doc.slide_count(), "opened pptx");
        Ok(Box::new(doc))
    }
}

struct Part {
    name: String,
    data: Vec<u8>,
    is_dir: bool,
}

/// An opened `.pptx` held fully in memory.
pub struct PptxDocument {
    source: PathBuf,
    fs: Arc<dyn FileSystem>,
    parts: Vec<Part>,
    /// Indices into `parts`, in presentation order.
    slides: Vec<usize>,
}

impl fmt::Debug for PptxDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PptxDocument")
            .field("source", &self.source)
            .field("parts", &self.parts.len())
            .field(
                "slides",
                &self
                    .slides
                    .iter()
                    .map(|&i| self.parts[i].name.as_str())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl PptxDocument {
    pub fn from_bytes(source: &Path, fs: Arc<dyn FileSystem>, bytes: &[u8]) -> Result<Self> {
        let format_err = |message: String| DeckError::document(source, message);

        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| format_err(format!("not a zip container: {e}")))?;

        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| format_err(format!("corrupt zip entry #{i}: {e}")))?;
            let name = file.name().to_string();
            let is_dir = file.is_dir();
            let mut data = Vec::new();
            if !is_dir {
                file.read_to_end(&mut data)
                    .map_err(|e| format_err(format!("cannot read part {name}: {e}")))?;
            }
            parts.push(Part { name, data, is_dir });
        }

        let mut doc = Self {
            source: source.to_path_buf(),
            fs,
            parts,
            slides: Vec::new(),
        };
        doc.slides = doc.locate_slides()?;
        Ok(doc)
    }

    /// Serialize into a fresh zip container.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let zip_err = |e: zip::result::ZipError| {
            DeckError::document(&self.source, format!("cannot write zip container: {e}"))
        };

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for part in &self.parts {
            if part.is_dir {
                writer.add_directory(part.name.as_str(), options).map_err(zip_err)?;
            } else {
                writer.start_file(part.name.as_str(), options).map_err(zip_err)?;
                writer.write_all(&part.data)?;
            }
        }

        Ok(writer.finish().map_err(zip_err)?.into_inner())
    }

    /// Part names of the slides, in presentation order.
    pub fn slide_parts(&self) -> Vec<&str> {
        self.slides.iter().map(|&i| self.parts[i].name.as_str()).collect()
    }

    /// Whether slide `index` is currently shown. Slides without a `show`
    /// attribute are shown.
    pub fn is_slide_visible(&self, index: usize) -> Result<bool> {
        let xml = self.slide_xml(index)?;
        let pats = patterns()?;
        let root = pats
            .slide_root
            .find(&xml)
            .ok_or_else(|| self.error(format!("slide {index} has no <p:sld> root")))?;
        Ok(!root.as_str().contains(r#"show="0""#))
    }

    /// Concatenated text of all runs on slide `index`, unescaped.
    pub fn slide_text(&self, index: usize) -> Result<String> {
        let xml = self.slide_xml(index)?;
        let pats = patterns()?;
        Ok(pats
            .text_run
            .captures_iter(&xml)
            .map(|caps| unescape(&caps[2]))
            .collect::<Vec<_>>()
            .join(""))
    }

    fn error(&self, message: impl Into<String>) -> DeckError {
        DeckError::document(&self.source, message)
    }

    fn part_text(&self, name: &str) -> Result<Option<String>> {
        let Some(part) = self.parts.iter().find(|p| p.name == name) else {
            return Ok(None);
        };
        String::from_utf8(part.data.clone())
            .map(Some)
            .map_err(|_| self.error(format!("part {name} is not valid UTF-8")))
    }

    fn locate_slides(&self) -> Result<Vec<usize>> {
        let pats = patterns()?;

        let presentation = self
            .part_text(PRESENTATION_PART)?
            .ok_or_else(|| self.error(format!("missing {PRESENTATION_PART}")))?;

        // A deck without slides has no list at all.
        let Some(list) = pats.slide_id_list.captures(&presentation) else {
            return Ok(Vec::new());
        };

        let rels = self
            .part_text(PRESENTATION_RELS_PART)?
            .ok_or_else(|| self.error(format!("missing {PRESENTATION_RELS_PART}")))?;

        let targets: HashMap<String, String> = pats
            .relationship
            .find_iter(&rels)
            .filter_map(|tag| {
                let attrs = attributes(pats, tag.as_str());
                Some((attrs.get("Id")?.clone(), attrs.get("Target")?.clone()))
            })
            .collect();

        let mut slides = Vec::new();
        for tag in pats.slide_id.find_iter(&list[1]) {
            let attrs = attributes(pats, tag.as_str());
            let rel_id = attrs
                .get("r:id")
                .ok_or_else(|| self.error("slide id without r:id"))?;
            let target = targets
                .get(rel_id)
                .ok_or_else(|| self.error(format!("unknown slide relationship {rel_id}")))?;
            let name = resolve_part("ppt", target);
            let index = self
                .parts
                .iter()
                .position(|p| p.name == name)
                .ok_or_else(|| self.error(format!("missing slide part {name}")))?;
            slides.push(index);
        }

        Ok(slides)
    }

    fn slide_part(&self, index: usize) -> Result<usize> {
        self.slides.get(index).copied().ok_or_else(|| {
            self.error(format!(
                "slide index {index} out of range (document has {} slides)",
                self.slides.len()
            ))
        })
    }

    fn slide_xml(&self, index: usize) -> Result<String> {
        let part = &self.parts[self.slide_part(index)?];
        String::from_utf8(part.data.clone())
            .map_err(|_| self.error(format!("part {} is not valid UTF-8", part.name)))
    }

    fn set_slide_xml(&mut self, index: usize, xml: String) -> Result<()> {
        let part = self.slide_part(index)?;
        self.parts[part].data = xml.into_bytes();
        Ok(())
    }
}

impl SlideDocument for PptxDocument {
    fn slide_count(&self) -> usize {
        self.slides.len()
    }

    fn set_slide_visible(&mut self, index: usize, visible: bool) -> Result<()> {
        let xml = self.slide_xml(index)?;
        let pats = patterns()?;
        let root = pats
            .slide_root
            .find(&xml)
            .ok_or_else(|| self.error(format!("slide {index} has no <p:sld> root")))?;

        let flag = format!(r#" show="{}""#, if visible { "1" } else { "0" });
        let tag = root.as_str();
        let new_tag = if pats.show_attr.is_match(tag) {
            pats.show_attr.replace(tag, flag.as_str()).into_owned()
        } else {
            format!("{}{}>", &tag[..tag.len() - 1], flag)
        };

        let updated = format!("{}{}{}", &xml[..root.start()], new_tag, &xml[root.end()..]);
        self.set_slide_xml(index, updated)
    }

    fn replace_text(&mut self, index: usize, pattern: &str, value: &str) -> Result<usize> {
        let xml = self.slide_xml(index)?;
        if pattern.is_empty() {
            return Ok(0);
        }

        let pats = patterns()?;
        let mut count = 0;
        let updated = pats
            .text_run
            .replace_all(&xml, |caps: &Captures<'_>| {
                let text = unescape(&caps[2]);
                let hits = text.matches(pattern).count();
                if hits == 0 {
                    return caps[0].to_string();
                }
                count += hits;
                format!("{}{}{}", &caps[1], escape(&text.replace(pattern, value)), &caps[3])
            })
            .into_owned();

        if count > 0 {
            self.set_slide_xml(index, updated)?;
        }
        Ok(count)
    }

    fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        self.fs.write(path, &bytes)?;
        debug!(path = ?path, bytes = bytes.len(), "saved pptx");
        Ok(())
    }
}

fn attributes(pats: &Patterns, tag: &str) -> HashMap<String, String> {
    pats.attribute
        .captures_iter(tag)
        .map(|caps| (caps[1].to_string(), unescape(&caps[2])))
        .collect()
}

/// Resolve a relationship target relative to the directory `base`.
fn resolve_part(base: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(end) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };

        let entity = &tail[1..end];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };

        match decoded {
            Some(c) => out.push(c),
            None => out.push_str(&tail[..=end]),
        }
        rest = &tail[end + 1..];
    }

    out.push_str(rest);
    out
}
