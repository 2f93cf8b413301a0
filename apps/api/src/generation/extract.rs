//! Lecture text extraction from uploaded files.
//!
//! Plain text and markdown are decoded as lossy UTF-8. PDFs go through
//! `pdf-extract` and Word documents through `zip` + `roxmltree`, both on the
//! blocking pool; a failing or panicking extraction is reported as an
//! `ExtractError` and the caller turns it into a warning.
//! Any other file type is decoded as lossy UTF-8.

use std::io::{Cursor, Read};

use anyhow::Context;
use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, warn};

pub const MANUAL_NOTES_LABEL: &str = "Manual Notes";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("could not extract text from {filename}: {reason}")]
    Unreadable { filename: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Text,
    Pdf,
    Docx,
    Other,
}

fn file_kind(filename: &str) -> FileKind {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".txt") || lower.ends_with(".md") {
        FileKind::Text
    } else if lower.ends_with(".pdf") {
        FileKind::Pdf
    } else if lower.ends_with(".docx") {
        FileKind::Docx
    } else {
        FileKind::Other
    }
}

pub async fn extract_text(filename: &str, bytes: Bytes) -> Result<String, ExtractError> {
    let unreadable = |reason: String| ExtractError::Unreadable {
        filename: filename.to_string(),
        reason,
    };
    match file_kind(filename) {
        FileKind::Text | FileKind::Other => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        FileKind::Pdf => {
            let text =
                tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
                    .await
                    .map_err(|e| unreadable(format!("extraction aborted: {e}")))?
                    .map_err(|e| unreadable(e.to_string()))?;
            debug!(filename, chars = text.len(), "extracted PDF text");
            Ok(text)
        }
        FileKind::Docx => {
            let text = tokio::task::spawn_blocking(move || docx_text(&bytes))
                .await
                .map_err(|e| unreadable(format!("extraction aborted: {e}")))?
                .map_err(|e| unreadable(format!("{e:#}")))?;
            debug!(filename, chars = text.len(), "extracted DOCX text");
            Ok(text)
        }
    }
}

const WORDPROCESSING_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Text of the body paragraphs of a `.docx`, one paragraph per line.
fn docx_text(bytes: &[u8]) -> anyhow::Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).context("not a zip archive")?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .context("missing word/document.xml")?
        .read_to_string(&mut xml)
        .context("word/document.xml is not UTF-8")?;

    let doc = roxmltree::Document::parse(&xml).context("malformed word/document.xml")?;
    let Some(body) = doc.root_element().children().find(|n| is_word(*n, "body")) else {
        return Ok(String::new());
    };

    let paragraphs: Vec<String> = body
        .children()
        .filter(|n| is_word(*n, "p"))
        .map(|p| {
            let mut text = String::new();
            for node in p.descendants() {
                if is_word(node, "t") {
                    text.push_str(node.text().unwrap_or_default());
                } else if is_word(node, "tab") {
                    text.push('\t');
                } else if is_word(node, "br") {
                    text.push('\n');
                }
            }
            text
        })
        .collect();
    Ok(paragraphs.join("\n"))
}

fn is_word(node: roxmltree::Node, name: &str) -> bool {
    node.tag_name().name() == name && node.tag_name().namespace() == Some(WORDPROCESSING_NS)
}

/// Frames one source document for the prompt.
pub fn frame_document(label: &str, text: &str) -> String {
    format!("--- {label} ---\n{text}")
}

/// Collects lecture material from uploads and manual notes.
#[derive(Debug, Default)]
pub struct LectureMaterial {
    sections: Vec<String>,
    pub warnings: Vec<String>,
}

impl LectureMaterial {
    pub async fn add_upload(&mut self, filename: &str, bytes: Bytes) {
        match extract_text(filename, bytes).await {
            Ok(text) if !text.trim().is_empty() => {
                self.sections.push(frame_document(filename, &text));
            }
            Ok(_) => {
                warn!(filename, "upload contained no text");
                self.warnings.push(format!("{filename} contained no extractable text"));
            }
            Err(e) => {
                warn!(filename, "upload could not be read: {e}");
                self.warnings.push(e.to_string());
            }
        }
    }

    pub fn add_manual_notes(&mut self, notes: &str) {
        if !notes.trim().is_empty() {
            self.sections.push(frame_document(MANUAL_NOTES_LABEL, notes));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// All sections separated by blank lines.
    pub fn combined(&self) -> String {
        self.sections.join("\n\n")
    }
}
