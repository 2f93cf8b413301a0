//! Content dimension estimation and greedy word wrap.
//!
//! `layout_content` is the only place content is wrapped. The height estimate
//! used by the editor preview, the box sizing used by the packer and the line
//! list drawn by the renderer are all read off the same [`ContentLayout`].

use serde::Serialize;

use crate::layout::classify::{classify_content, ClassifiedLine, LineKind, Span};
use crate::layout::font_metrics::{get_metrics, FontFace};
use crate::layout::model::ContentBox;
use crate::layout::policy::LayoutPolicy;

// ────────────────────────────────────────────────────────────────────────────
// Wrapped output types
// ────────────────────────────────────────────────────────────────────────────

/// A contiguous piece of one wrapped line in a single style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Run {
    pub text: String,
    pub emphasis: bool,
}

/// One visual line after wrapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WrappedLine {
    pub runs: Vec<Run>,
}

impl WrappedLine {
    fn push(&mut self, text: &str, emphasis: bool) {
        match self.runs.last_mut() {
            Some(last) if last.emphasis == emphasis => last.text.push_str(text),
            _ => self.runs.push(Run {
                text: text.to_string(),
                emphasis,
            }),
        }
    }
}

/// A source line after classification and wrapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LaidOutLine {
    /// A blank source line.
    Gap { height: f64 },
    /// A text-bearing source line wrapped to one or more visual lines.
    Text {
        kind: LineKind,
        indent: f64,
        prefix_width: f64,
        marker: Option<String>,
        /// Face used for measurement (content or code font).
        font: FontFace,
        size: f64,
        wrapped: Vec<WrappedLine>,
    },
}

/// The wrapped content of one box at one width.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentLayout {
    pub lines: Vec<LaidOutLine>,
    /// Sum of all line contributions, excluding header and padding.
    pub height: f64,
}

// ────────────────────────────────────────────────────────────────────────────
// Word wrap
// ────────────────────────────────────────────────────────────────────────────

/// A whitespace-free word, possibly made of differently emphasised fragments.
type Word = Vec<Run>;

fn split_words(spans: &[Span]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current: Word = Vec::new();

    for span in spans {
        for (i, piece) in span.text.split(char::is_whitespace).enumerate() {
            if i > 0 && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            if !piece.is_empty() {
                current.push(Run {
                    text: piece.to_string(),
                    emphasis: span.emphasis,
                });
            }
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Greedily wraps spans into the fewest lines whose measured width fits `max_width`.
///
/// Widths are accumulated in integer font units and scaled once per comparison, so
/// the decision for a candidate line equals `measure(candidate) <= max_width`
/// exactly. A word wider than `max_width` occupies a line of its own. Always returns
/// at least one (possibly empty) line.
pub fn wrap_spans(spans: &[Span], max_width: f64, font: FontFace, size: f64) -> Vec<WrappedLine> {
    let metrics = get_metrics(font);
    let space_units = u64::from(metrics.char_units(' '));
    let to_points = |units: u64| units as f64 * size / 1000.0;

    let mut lines = Vec::new();
    let mut current = WrappedLine::default();
    let mut current_units: u64 = 0;

    for word in split_words(spans) {
        let word_units: u64 = word.iter().map(|r| metrics.measure_units(&r.text)).sum();

        if current.runs.is_empty() {
            for run in &word {
                current.push(&run.text, run.emphasis);
            }
            current_units = word_units;
            continue;
        }

        let candidate = current_units + space_units + word_units;
        if to_points(candidate) <= max_width {
            // The separating space takes the style of the word it precedes.
            current.push(" ", word[0].emphasis);
            for run in &word {
                current.push(&run.text, run.emphasis);
            }
            current_units = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            for run in &word {
                current.push(&run.text, run.emphasis);
            }
            current_units = word_units;
        }
    }

    if !current.runs.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

// ────────────────────────────────────────────────────────────────────────────
// Estimation
// ────────────────────────────────────────────────────────────────────────────

/// Measurement face and size for a classified line.
fn measure_style(line: &ClassifiedLine, policy: &LayoutPolicy) -> (FontFace, f64) {
    match line.kind {
        LineKind::CodeLine => (policy.fonts.code, policy.typography.code_font_size),
        _ => (policy.fonts.content, policy.typography.content_font_size),
    }
}

/// Classifies and wraps `content` for a box of `available_width` points.
pub fn layout_content(content: &str, available_width: f64, policy: &LayoutPolicy) -> ContentLayout {
    let t = &policy.typography;
    let mut lines = Vec::new();
    let mut height = 0.0;

    for line in classify_content(content, t) {
        match line.kind {
            LineKind::CodeFence => {}
            LineKind::Blank => {
                height += t.blank_line_height;
                lines.push(LaidOutLine::Gap {
                    height: t.blank_line_height,
                });
            }
            _ => {
                let (font, size) = measure_style(&line, policy);
                let wrap_width =
                    available_width - t.box_padding * 2.0 - line.indent_width - line.prefix_width;
                let wrapped = wrap_spans(&line.spans, wrap_width, font, size);
                height += wrapped.len() as f64 * t.line_height;
                lines.push(LaidOutLine::Text {
                    kind: line.kind,
                    indent: line.indent_width,
                    prefix_width: line.prefix_width,
                    marker: line.marker,
                    font,
                    size,
                    wrapped,
                });
            }
        }
    }

    ContentLayout { lines, height }
}

/// Height consumed by `content` wrapped inside a box of `available_width` points.
pub fn estimate_height(content: &str, available_width: f64, policy: &LayoutPolicy) -> f64 {
    layout_content(content, available_width, policy).height
}

/// Narrowest box width that keeps every line (and the header) unwrapped, clamped to
/// `[min_box_width, max_box_width]`.
pub fn estimate_min_width(content_box: &ContentBox, policy: &LayoutPolicy) -> f64 {
    let t = &policy.typography;

    let title_width = get_metrics(policy.fonts.header)
        .measure_str(&content_box.header_text(), t.header_font_size)
        + t.title_slack;

    let widest_line = classify_content(&content_box.content, t)
        .iter()
        .filter(|line| line.has_text())
        .map(|line| {
            let (font, size) = measure_style(line, policy);
            let text = get_metrics(font).measure_str(&line.cleaned_text(), size);
            line.indent_width + line.prefix_width + text + t.box_padding * 2.0
        })
        .fold(title_width, f64::max);

    (widest_line + t.width_slack).clamp(t.min_box_width, policy.max_box_width())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font_metrics::measure;
    use crate::layout::policy::MM;

    impl WrappedLine {
        fn text(&self) -> String {
            self.runs.iter().map(|r| r.text.as_str()).collect()
        }
    }

    fn wrap_text(text: &str, max_width: f64, font: FontFace, size: f64) -> Vec<String> {
        let spans = [Span {
            text: text.to_string(),
            emphasis: false,
        }];
        wrap_spans(&spans, max_width, font, size)
            .into_iter()
            .map(|line| line.text())
            .collect()
    }

    fn policy() -> LayoutPolicy {
        LayoutPolicy::default()
    }

    #[test]
    fn test_wrap_empty_text_yields_one_empty_line() {
        assert_eq!(wrap_text("", 100.0, FontFace::Helvetica, 4.5), vec![String::new()]);
        assert_eq!(wrap_text("   ", 100.0, FontFace::Helvetica, 4.5), vec![String::new()]);
    }

    #[test]
    fn test_wrap_fits_on_one_line_when_wide_enough() {
        let lines = wrap_text("alpha beta gamma", 1000.0, FontFace::Helvetica, 4.5);
        assert_eq!(lines, vec!["alpha beta gamma"]);
    }

    #[test]
    fn test_wrap_breaks_at_exact_measured_width() {
        let text = "alpha beta gamma";
        let exact = measure("alpha beta", FontFace::Helvetica, 4.5);
        let lines = wrap_text(text, exact, FontFace::Helvetica, 4.5);
        assert_eq!(lines, vec!["alpha beta", "gamma"]);

        let lines = wrap_text(text, exact - 0.001, FontFace::Helvetica, 4.5);
        assert_eq!(lines, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_overlong_word_takes_its_own_line() {
        let lines = wrap_text("a supercalifragilistic b", 10.0, FontFace::Helvetica, 4.5);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn test_wrap_collapses_whitespace() {
        let lines = wrap_text("  one \t two  ", 1000.0, FontFace::Helvetica, 4.5);
        assert_eq!(lines, vec!["one two"]);
    }

    #[test]
    fn test_wrap_keeps_emphasis_runs() {
        let spans = vec![
            Span { text: "Scope".into(), emphasis: true },
            Span { text: ": what is in".into(), emphasis: false },
        ];
        let lines = wrap_spans(&spans, 1000.0, FontFace::Helvetica, 4.5);
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0].runs,
            vec![
                Run { text: "Scope".into(), emphasis: true },
                Run { text: ": what is in".into(), emphasis: false },
            ]
        );
        assert_eq!(lines[0].text(), "Scope: what is in");
    }

    #[test]
    fn test_mixed_style_word_is_not_split() {
        let spans = vec![
            Span { text: "pre".into(), emphasis: false },
            Span { text: "BOLD".into(), emphasis: true },
            Span { text: "post tail".into(), emphasis: false },
        ];
        let width = measure("preBOLDpost", FontFace::Helvetica, 4.5);
        let lines = wrap_spans(&spans, width, FontFace::Helvetica, 4.5);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "preBOLDpost");
        assert_eq!(lines[1].text(), "tail");
    }

    #[test]
    fn test_bullets_blank_and_plain_height() {
        let p = policy();
        let t = &p.typography;
        let height = estimate_height("\u{2022} one\n\u{2022} two\n\nthree", 200.0, &p);
        let expected = 2.0 * t.line_height + t.blank_line_height + t.line_height;
        assert!(
            (height - expected).abs() < 1e-9,
            "expected {expected}, got {height}"
        );
    }

    #[test]
    fn test_fences_contribute_no_height() {
        let p = policy();
        let with_fences = estimate_height("```\nlet x = 1;\n```", 200.0, &p);
        assert!((with_fences - p.typography.line_height).abs() < 1e-9);
    }

    #[test]
    fn test_narrow_width_wraps_more_lines() {
        let p = policy();
        let content = "A long sentence about earned value management and schedule variance";
        let wide = estimate_height(content, 400.0, &p);
        let narrow = estimate_height(content, 60.0, &p);
        assert!(narrow > wide, "narrow {narrow} should exceed wide {wide}");
    }

    #[test]
    fn test_estimate_height_is_reproducible() {
        let p = policy();
        let content =
            "**Bold** lead\n- item with `code`\n  1. nested number\n\n```\nfn main() {}\n```";
        let a = estimate_height(content, 123.4, &p);
        let b = estimate_height(content, 123.4, &p);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_min_width_has_floor() {
        let p = policy();
        let b = ContentBox::new("A1", "X", "hi");
        assert_eq!(estimate_min_width(&b, &p), p.typography.min_box_width);
    }

    #[test]
    fn test_min_width_has_ceiling() {
        let p = policy();
        let b = ContentBox::new("A1", "Long", "word ".repeat(200));
        assert_eq!(estimate_min_width(&b, &p), p.max_box_width());
    }

    #[test]
    fn test_min_width_ignores_emphasis_markers() {
        let p = policy();
        let content = "x".repeat(60);
        let plain = ContentBox::new("A1", "T", content.clone());
        let starred = ContentBox::new("A1", "T", format!("**{content}**"));
        assert_eq!(estimate_min_width(&plain, &p), estimate_min_width(&starred, &p));
    }

    #[test]
    fn test_min_width_counts_indent_and_prefix() {
        let p = policy();
        let body = "m".repeat(40);
        let flat = ContentBox::new("A1", "T", body.clone());
        let nested = ContentBox::new("A1", "T", format!("    - {body}"));
        let diff = estimate_min_width(&nested, &p) - estimate_min_width(&flat, &p);
        let expected = 4.0 * MM + p.typography.bullet_prefix_width;
        assert!((diff - expected).abs() < 1e-9, "diff {diff} expected {expected}");
    }

    #[test]
    fn test_min_width_content_fits_unwrapped() {
        let p = policy();
        let b = ContentBox::new("B2", "Risk", "- Identify risks early\n1. Assess **impact**");
        let width = estimate_min_width(&b, &p);
        let layout = layout_content(&b.content, width, &p);
        for line in &layout.lines {
            if let LaidOutLine::Text { wrapped, .. } = line {
                assert_eq!(wrapped.len(), 1, "line wrapped at its own min width");
            }
        }
    }
}
