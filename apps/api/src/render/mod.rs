// Box rendering.
//
// compose_box turns a placed box into a frame plus styled lines, reading the same
// ContentLayout the height estimate sums. A Surface draws composed boxes; the PDF
// surface lives in pdf.rs. One RenderContext exists per render call and carries the
// surface, policy and palette explicitly.

pub mod palette;
pub mod pdf;

use thiserror::Error;

use crate::layout::classify::LineKind;
use crate::layout::estimate::{layout_content, LaidOutLine};
use crate::layout::font_metrics::{measure, FontFace};
use crate::layout::policy::{LayoutPolicy, MM};
use crate::layout::{ContentBox, LayoutPlan, PlacedBox, Rect};

pub use palette::{Palette, Rgb};
pub use pdf::PdfSurface;

/// Horizontal inset of the header text inside the header bar.
const HEADER_INSET: f64 = 1.0 * MM;
/// Header baseline height above the bottom of the header bar.
const HEADER_BASELINE: f64 = 0.9 * MM;
/// First content baseline sits this fraction of a line below the padding.
const FIRST_BASELINE_FRACTION: f64 = 0.7;
/// Headers are never truncated below this many characters.
const MIN_HEADER_CHARS: usize = 20;
pub const BORDER_WIDTH: f64 = 0.4;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF encoding failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("I/O error while writing PDF: {0}")]
    Io(#[from] std::io::Error),
}

// ────────────────────────────────────────────────────────────────────────────
// Composed output
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct StyledRun {
    pub x: f64,
    pub text: String,
    pub font: FontFace,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyledLine {
    pub baseline: f64,
    pub runs: Vec<StyledRun>,
}

/// Everything a surface needs to draw one box. All coordinates are page space.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedBox {
    pub frame: Rect,
    pub header_bar: Rect,
    pub color: Rgb,
    pub header: StyledLine,
    pub lines: Vec<StyledLine>,
    /// Height of the wrapped content, as the estimator computed it.
    pub content_height: f64,
}

/// The drawing primitive: pages of `(rect, styled lines)` boxes.
pub trait Surface {
    fn begin_page(&mut self, width: f64, height: f64) -> Result<(), RenderError>;
    fn draw_box(&mut self, composed: &ComposedBox) -> Result<(), RenderError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Composition
// ────────────────────────────────────────────────────────────────────────────

/// Shortens `header` with `...` until it fits `max_width`, never below
/// `MIN_HEADER_CHARS` characters.
pub fn truncate_header(header: &str, max_width: f64, font: FontFace, size: f64) -> String {
    let mut text = header.to_string();
    while measure(&text, font, size) > max_width && text.chars().count() > MIN_HEADER_CHARS {
        let keep = text.chars().count() - 4;
        text = text.chars().take(keep).collect::<String>() + "...";
    }
    text
}

/// Composes one placed box.
///
/// Content is wrapped at `placed.width` with the same rule the estimator uses.
/// With `clip` set, visual lines whose baseline falls below the content area are
/// dropped; otherwise every line is emitted.
pub fn compose_box(
    content_box: &ContentBox,
    placed: &PlacedBox,
    policy: &LayoutPolicy,
    palette: &Palette,
    clip: bool,
) -> ComposedBox {
    let t = &policy.typography;
    let fonts = &policy.fonts;
    let frame = placed.rect();
    let header_bar = Rect {
        height: t.header_height,
        ..frame
    };

    let header = StyledLine {
        baseline: frame.y - t.header_height + HEADER_BASELINE,
        runs: vec![StyledRun {
            x: frame.x + HEADER_INSET,
            text: truncate_header(
                &content_box.header_text(),
                frame.width - 2.0 * HEADER_INSET,
                fonts.header,
                t.header_font_size,
            ),
            font: fonts.header,
            size: t.header_font_size,
        }],
    };

    let layout = layout_content(&content_box.content, frame.width, policy);
    let content_bottom = frame.bottom() + t.box_padding;
    let mut baseline =
        frame.y - t.header_height - t.box_padding - t.line_height * FIRST_BASELINE_FRACTION;
    let mut lines = Vec::new();

    'lines: for line in &layout.lines {
        match line {
            LaidOutLine::Gap { height } => baseline -= height,
            LaidOutLine::Text {
                kind,
                indent,
                prefix_width,
                marker,
                font,
                size,
                wrapped,
            } => {
                let start_x = frame.x + t.box_padding + indent;
                let is_code = *kind == LineKind::CodeLine;

                for (i, visual) in wrapped.iter().enumerate() {
                    if clip && baseline < content_bottom {
                        break 'lines;
                    }
                    let mut runs = Vec::new();
                    if i == 0 {
                        if let Some(marker) = marker {
                            runs.push(StyledRun {
                                x: start_x,
                                text: marker.clone(),
                                font: fonts.content,
                                size: t.content_font_size,
                            });
                        }
                    }

                    let mut x = start_x + prefix_width;
                    for run in &visual.runs {
                        let run_font = if is_code {
                            *font
                        } else if run.emphasis {
                            fonts.emphasis
                        } else {
                            fonts.content
                        };
                        runs.push(StyledRun {
                            x,
                            text: run.text.clone(),
                            font: run_font,
                            size: *size,
                        });
                        x += measure(&run.text, run_font, *size);
                    }

                    lines.push(StyledLine { baseline, runs });
                    baseline -= t.line_height;
                }
            }
        }
    }

    ComposedBox {
        frame,
        header_bar,
        color: palette.color_for(content_box.category()),
        header,
        lines,
        content_height: layout.height,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Render context
// ────────────────────────────────────────────────────────────────────────────

/// State of a single render call.
pub struct RenderContext<'a, S: Surface> {
    surface: &'a mut S,
    policy: &'a LayoutPolicy,
    palette: &'a Palette,
    pages_started: u32,
}

impl<'a, S: Surface> RenderContext<'a, S> {
    pub fn new(surface: &'a mut S, policy: &'a LayoutPolicy, palette: &'a Palette) -> Self {
        Self {
            surface,
            policy,
            palette,
            pages_started: 0,
        }
    }

    pub fn pages_started(&self) -> u32 {
        self.pages_started
    }

    /// Draws every occupied page of `plan` in ascending page order. Pages without
    /// boxes are skipped.
    pub fn render(
        &mut self,
        boxes: &[ContentBox],
        plan: &LayoutPlan,
        clip: bool,
    ) -> Result<(), RenderError> {
        for page in plan.pages() {
            self.surface
                .begin_page(self.policy.page.width, self.policy.page.height)?;
            self.pages_started += 1;

            for placed in plan.placed.iter().filter(|p| p.page == page) {
                let Some(content_box) = boxes.get(placed.source) else {
                    continue;
                };
                let composed = compose_box(content_box, placed, self.policy, self.palette, clip);
                self.surface.draw_box(&composed)?;
            }
        }
        Ok(())
    }
}

/// Renders a plan to PDF bytes.
pub fn render_pdf(
    boxes: &[ContentBox],
    plan: &LayoutPlan,
    policy: &LayoutPolicy,
    palette: &Palette,
    clip: bool,
) -> Result<Vec<u8>, RenderError> {
    let mut surface = PdfSurface::new("Cheat Sheet");
    RenderContext::new(&mut surface, policy, palette).render(boxes, plan, clip)?;
    surface.finish()
}
