//! Data model shared by the layout core, the renderer and the HTTP handlers.

use serde::{Deserialize, Serialize};

/// Category used when an id does not start with an uppercase letter.
pub const FALLBACK_CATEGORY: char = 'A';

/// Derives the single-letter category of a box id.
///
/// The category is the id's leading uppercase ASCII letter. Ids that do not start
/// with one fall back to `FALLBACK_CATEGORY`. Always re-derived, never stored.
pub fn category(id: &str) -> char {
    match id.chars().next() {
        Some(c) if c.is_ascii_uppercase() => c,
        _ => FALLBACK_CATEGORY,
    }
}

/// True if `id` has the strict `[A-Z][0-9]+` shape (e.g. `A1`, `C10`).
pub fn is_conforming_id(id: &str) -> bool {
    let mut chars = id.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => {}
        _ => return false,
    }
    let rest = chars.as_str();
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
}

// ────────────────────────────────────────────────────────────────────────────
// Boxes through the pipeline
// ────────────────────────────────────────────────────────────────────────────

/// A titled content block as parsed from the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBox {
    pub id: String,
    pub title: String,
    pub content: String,
}

impl ContentBox {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
        }
    }

    pub fn category(&self) -> char {
        category(&self.id)
    }

    /// Text drawn in the header bar.
    pub fn header_text(&self) -> String {
        format!("{} {}", self.id, self.title)
    }
}

/// A box with its computed size in points.
///
/// `source` indexes the `ContentBox` slice the size was computed from, so content
/// is never copied through the packer.
#[derive(Debug, Clone, PartialEq)]
pub struct SizedBox {
    pub source: usize,
    pub id: String,
    pub width: f64,
    pub height: f64,
}

/// A sized box placed on a page. `(x, y)` is the top-left corner in page space
/// (bottom-left origin, Y up), so the box spans `y - height ..= y` vertically.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedBox {
    #[serde(skip)]
    pub source: usize,
    pub id: String,
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PlacedBox {
    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// Axis-aligned rectangle in page space. `(x, y)` is the top-left corner and the
/// rectangle spans `y - height ..= y`, matching how the packer stores placements
/// so shelf edges compare exactly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y - self.height
    }

    /// Overlap test with `gap` kept clear on the horizontal trailing edges.
    ///
    /// Rectangles that exactly touch, horizontally at `gap` distance or vertically at
    /// zero distance, do not overlap.
    pub fn overlaps_with_gap(&self, other: &Rect, gap: f64) -> bool {
        !(self.x + self.width + gap <= other.x
            || self.x >= other.x + other.width + gap
            || self.y - self.height >= other.y
            || self.y <= other.y - other.height)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Display-space contract with the editor
// ────────────────────────────────────────────────────────────────────────────

/// A placed box projected into display space (pixels, top-left origin, pages
/// stacked vertically).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutEntry {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub page: u32,
}

/// Editor-supplied geometry for one box, in display space. The page is implied by `y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutOverride {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

// ────────────────────────────────────────────────────────────────────────────
// Warnings
// ────────────────────────────────────────────────────────────────────────────

/// Non-fatal conditions surfaced to the caller next to a successful result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Box id does not match `[A-Z][0-9]+`; its category falls back as documented.
    NonConformingId { id: String, title_preview: String },
    /// A box had no entry in the supplied layout and was packed automatically.
    MissingOverride { id: String },
    /// A layout entry names a box that does not exist.
    UnknownOverride { id: String },
    /// A second layout entry for the same id was ignored.
    DuplicateOverride { id: String },
    /// Supplied geometry left the printable area and was pulled back in.
    OverrideClamped { id: String },
}
