//! Parser for the delimited box format produced by the generator.
//!
//! ```text
//! [BOX:A1]
//! [TITLE:Introduction to Project Management]
//! content lines...
//! [/BOX]
//! ```

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::layout::model::is_conforming_id;
use crate::layout::{ContentBox, Warning};

const TITLE_PREVIEW_CHARS: usize = 50;

static BOX_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\[BOX:([A-Za-z0-9\-_.]+)\]\s*\[TITLE:([^\]]+)\]\s*(.*?)\[/BOX\]")
        .expect("BOX_PATTERN is a valid regex")
});

/// Topic lines carrying an id prefix, e.g. `A1: Introduction`.
static TOPIC_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Z][0-9]+)\s*:").expect("TOPIC_ID_PATTERN is a valid regex"));

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedSheet {
    pub boxes: Vec<ContentBox>,
    pub warnings: Vec<Warning>,
}

/// Extracts every well-formed box in document order. Text outside boxes and
/// unterminated boxes are ignored. Ids outside `[A-Z][0-9]+` are kept with a warning.
pub fn parse_boxes(raw: &str) -> ParsedSheet {
    let mut sheet = ParsedSheet::default();

    for caps in BOX_PATTERN.captures_iter(raw) {
        let id = caps[1].trim().to_string();
        let title = caps[2].trim().to_string();
        let content = caps[3].trim().to_string();

        if !is_conforming_id(&id) {
            let title_preview = title_preview(&title);
            warn!(id = %id, title = %title_preview, "box id does not match [A-Z][0-9]+");
            sheet.warnings.push(Warning::NonConformingId {
                id: id.clone(),
                title_preview,
            });
        }

        sheet.boxes.push(ContentBox { id, title, content });
    }

    sheet
}

fn title_preview(title: &str) -> String {
    if title.chars().count() > TITLE_PREVIEW_CHARS {
        let head: String = title.chars().take(TITLE_PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        title.to_string()
    }
}

/// Ids named by topic lines such as `B2: Stakeholder Communication`.
pub fn topic_ids<S: AsRef<str>>(topics: &[S]) -> Vec<String> {
    topics
        .iter()
        .filter_map(|t| TOPIC_ID_PATTERN.captures(t.as_ref()))
        .map(|caps| caps[1].to_string())
        .collect()
}

/// How a parsed sheet covers the expected topic ids. All lists are sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageReport {
    pub missing: Vec<String>,
    pub extra: Vec<String>,
    pub valid: Vec<String>,
    pub complete: bool,
}

pub fn validate_coverage(boxes: &[ContentBox], expected_ids: &[String]) -> CoverageReport {
    let found: BTreeSet<&str> = boxes.iter().map(|b| b.id.as_str()).collect();
    let expected: BTreeSet<&str> = expected_ids.iter().map(String::as_str).collect();

    let to_vec = |ids: Vec<&&str>| ids.into_iter().map(|s| s.to_string()).collect::<Vec<_>>();
    let missing = to_vec(expected.difference(&found).collect());
    let extra = to_vec(found.difference(&expected).collect());
    let valid = to_vec(found.intersection(&expected).collect());

    CoverageReport {
        complete: missing.is_empty(),
        missing,
        extra,
        valid,
    }
}
