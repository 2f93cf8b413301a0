//! Layout policy: page constraints, typography and display-space geometry.
//!
//! A `LayoutPolicy` is built once at startup, validated, and then shared read-only
//! by every request. Nothing in the layout core reads global state; every function
//! takes the policy it needs as an argument.

use serde::{Deserialize, Serialize};

use crate::layout::font_metrics::FontFace;
use crate::layout::LayoutError;

/// Points per millimetre.
pub const MM: f64 = 72.0 / 25.4;

/// A4 in points, landscape orientation.
pub const A4_LANDSCAPE: (f64, f64) = (841.889_763_779_527_7, 595.275_590_551_181_2);

/// Editor canvas size of one page in display pixels (A4 landscape at 96 dpi).
pub const DISPLAY_PAGE: (f64, f64) = (1123.0, 794.0);

// ────────────────────────────────────────────────────────────────────────────
// Policy types
// ────────────────────────────────────────────────────────────────────────────

/// Physical page constraints in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    /// Gap kept between horizontally neighbouring boxes.
    pub column_gap: f64,
}

impl PageConfig {
    pub fn usable_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }

    pub fn usable_height(&self) -> f64 {
        self.height - 2.0 * self.margin
    }

    /// Y of the top margin line in page space (bottom-left origin).
    pub fn top(&self) -> f64 {
        self.height - self.margin
    }

    pub fn bottom(&self) -> f64 {
        self.margin
    }

    pub fn right(&self) -> f64 {
        self.width - self.margin
    }
}

/// The fonts used for each role in a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSet {
    pub header: FontFace,
    pub content: FontFace,
    /// Face used to draw `**emphasised**` runs. Measurement always uses `content`.
    pub emphasis: FontFace,
    pub code: FontFace,
}

impl Default for FontSet {
    fn default() -> Self {
        Self {
            header: FontFace::HelveticaBold,
            content: FontFace::Helvetica,
            emphasis: FontFace::HelveticaBold,
            code: FontFace::Courier,
        }
    }
}

/// Sizes and spacings used inside a box, all in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Typography {
    pub header_font_size: f64,
    pub content_font_size: f64,
    pub code_font_size: f64,
    pub header_height: f64,
    pub box_padding: f64,
    pub line_height: f64,
    /// Height contributed by an empty content line. Less than `line_height`.
    pub blank_line_height: f64,
    /// Indentation per leading whitespace character.
    pub indent_per_char: f64,
    pub max_indent: f64,
    pub bullet_prefix_width: f64,
    /// Reserved width per character of a `12.` style marker.
    pub number_prefix_per_char: f64,
    pub min_box_width: f64,
    /// Extra width added on top of the widest content line.
    pub width_slack: f64,
    /// Extra width added to the measured header text.
    pub title_slack: f64,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            header_font_size: 5.0,
            content_font_size: 4.5,
            code_font_size: 4.0,
            header_height: 3.0 * MM,
            box_padding: 1.0 * MM,
            line_height: 1.6 * MM,
            blank_line_height: 0.8 * MM,
            indent_per_char: 1.0 * MM,
            max_indent: 8.0 * MM,
            bullet_prefix_width: 2.0 * MM,
            number_prefix_per_char: 1.25 * MM,
            min_box_width: 25.0 * MM,
            width_slack: 2.0 * MM,
            title_slack: 3.0 * MM,
        }
    }
}

/// Size of one page in the editor's display space, in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub page_width: f64,
    pub page_height: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            page_width: DISPLAY_PAGE.0,
            page_height: DISPLAY_PAGE.1,
        }
    }
}

/// Everything the layout core needs to size, pack and map boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutPolicy {
    pub page: PageConfig,
    pub typography: Typography,
    pub fonts: FontSet,
    pub display: DisplayConfig,
}

impl Default for LayoutPolicy {
    fn default() -> Self {
        default_layout_policy(FontSet::default())
    }
}

/// Dense cheat-sheet layout on A4 landscape with 4mm margins and 2mm gaps.
pub fn default_layout_policy(fonts: FontSet) -> LayoutPolicy {
    LayoutPolicy {
        page: PageConfig {
            width: A4_LANDSCAPE.0,
            height: A4_LANDSCAPE.1,
            margin: 4.0 * MM,
            column_gap: 2.0 * MM,
        },
        typography: Typography::default(),
        fonts,
        display: DisplayConfig::default(),
    }
}

impl LayoutPolicy {
    /// Widest a single box may become: two of them plus one gap fill the usable width.
    pub fn max_box_width(&self) -> f64 {
        (self.page.usable_width() - self.page.column_gap) / 2.0
    }

    /// Rejects geometry under which packing could not terminate sensibly.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let page = &self.page;
        let t = &self.typography;

        let positive = [
            ("page width", page.width),
            ("page height", page.height),
            ("line height", t.line_height),
            ("content font size", t.content_font_size),
            ("header font size", t.header_font_size),
            ("code font size", t.code_font_size),
            ("display page width", self.display.page_width),
            ("display page height", self.display.page_height),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(LayoutError::InvalidPolicy(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        for (name, value) in [("margin", page.margin), ("column gap", page.column_gap)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(LayoutError::InvalidPolicy(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if page.usable_width() <= 0.0 || page.usable_height() <= 0.0 {
            return Err(LayoutError::InvalidPolicy(format!(
                "margin {:.2}pt leaves no printable area on a {:.2}x{:.2}pt page",
                page.margin, page.width, page.height
            )));
        }
        if t.min_box_width > self.max_box_width() {
            return Err(LayoutError::InvalidPolicy(format!(
                "minimum box width {:.2}pt exceeds the per-box ceiling {:.2}pt",
                t.min_box_width,
                self.max_box_width()
            )));
        }
        if t.blank_line_height >= t.line_height {
            return Err(LayoutError::InvalidPolicy(
                "blank line height must be smaller than the line height".to_string(),
            ));
        }
        if t.header_height + 2.0 * t.box_padding >= page.usable_height() {
            return Err(LayoutError::InvalidPolicy(
                "an empty box would not fit on a page".to_string(),
            ));
        }
        Ok(())
    }
}
