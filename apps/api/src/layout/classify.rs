//! Content line classification.
//!
//! Each raw content line is classified once into a [`ClassifiedLine`]. The line
//! carries its emphasis spans; the measured text and the drawn runs are both
//! projections of those spans, so measurement and rendering can never disagree
//! about where `**bold**` markers were.
//!
//! # Rules, in priority order
//! 1. Trimmed line starts with ```` ``` ````: toggles the code block, draws nothing.
//! 2. Inside a code block: `CodeLine`, no indent or prefix, markers kept literally.
//! 3. Whitespace-only: `Blank`.
//! 4. Starts with `"• "` or `"- "`: `Bullet`.
//! 5. Starts with `"<digits>. "`: `Numbered`.
//! 6. Anything else: `Plain`.

use serde::Serialize;

use crate::layout::policy::Typography;

const CODE_FENCE: &str = "```";
const BULLET_MARKER: &str = "\u{2022}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Blank,
    Bullet,
    Numbered,
    CodeFence,
    CodeLine,
    Plain,
}

/// A run of source text with or without `**emphasis**`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub text: String,
    pub emphasis: bool,
}

impl Span {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasis: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedLine {
    pub kind: LineKind,
    /// Marker drawn in the reserved prefix gutter: `•` for bullets, `12.` for numbers.
    pub marker: Option<String>,
    /// Emphasis-aware text with structural markers removed.
    pub spans: Vec<Span>,
    pub prefix_width: f64,
    pub indent_width: f64,
}

impl ClassifiedLine {
    fn empty(kind: LineKind) -> Self {
        Self {
            kind,
            marker: None,
            spans: Vec::new(),
            prefix_width: 0.0,
            indent_width: 0.0,
        }
    }

    /// Text used for width measurement: spans joined, emphasis markers gone.
    pub fn cleaned_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// True for lines that contribute wrapped text (everything but blanks and fences).
    pub fn has_text(&self) -> bool {
        !matches!(self.kind, LineKind::Blank | LineKind::CodeFence)
    }
}

/// Classifies one line. Returns the line and the code-block state for the next line.
pub fn classify_line(
    line: &str,
    in_code_block: bool,
    typography: &Typography,
) -> (ClassifiedLine, bool) {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let trimmed = line.trim();

    if trimmed.starts_with(CODE_FENCE) {
        return (ClassifiedLine::empty(LineKind::CodeFence), !in_code_block);
    }

    if in_code_block {
        let mut classified = ClassifiedLine::empty(LineKind::CodeLine);
        classified.spans = vec![Span::plain(trimmed)];
        return (classified, true);
    }

    if trimmed.is_empty() {
        return (ClassifiedLine::empty(LineKind::Blank), false);
    }

    let leading = line.chars().take_while(|c| c.is_whitespace()).count();
    let indent_width = (leading as f64 * typography.indent_per_char).min(typography.max_indent);

    let (kind, marker, body, prefix_width) = if let Some(rest) = strip_bullet(trimmed) {
        (
            LineKind::Bullet,
            Some(BULLET_MARKER.to_string()),
            rest,
            typography.bullet_prefix_width,
        )
    } else if let Some((number, rest)) = strip_number(trimmed) {
        let marker = format!("{number}.");
        let width = marker.chars().count() as f64 * typography.number_prefix_per_char;
        (LineKind::Numbered, Some(marker), rest, width)
    } else {
        (LineKind::Plain, None, trimmed, 0.0)
    };

    let classified = ClassifiedLine {
        kind,
        marker,
        spans: parse_emphasis(body),
        prefix_width,
        indent_width,
    };
    (classified, false)
}

/// Classifies every line of a box's content, threading the code-block state.
pub fn classify_content(content: &str, typography: &Typography) -> Vec<ClassifiedLine> {
    let mut in_code_block = false;
    content
        .split('\n')
        .map(|line| {
            let (classified, next) = classify_line(line, in_code_block, typography);
            in_code_block = next;
            classified
        })
        .collect()
}

/// Splits text into plain and `**emphasised**` spans.
///
/// An emphasis pair must enclose at least one character and no `*`. Unpaired or
/// malformed markers are kept as literal text.
pub fn parse_emphasis(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut rest = text;

    while let Some(start) = rest.find("**") {
        let after = &rest[start + 2..];
        match after.find('*') {
            Some(end) if end > 0 && after[end..].starts_with("**") => {
                plain.push_str(&rest[..start]);
                if !plain.is_empty() {
                    spans.push(Span::plain(std::mem::take(&mut plain)));
                }
                spans.push(Span {
                    text: after[..end].to_string(),
                    emphasis: true,
                });
                rest = &after[end + 2..];
            }
            _ => {
                // Not an opening marker here; keep one '*' and rescan from the next.
                plain.push_str(&rest[..start + 1]);
                rest = &rest[start + 1..];
            }
        }
    }

    plain.push_str(rest);
    if !plain.is_empty() {
        spans.push(Span::plain(plain));
    }
    spans
}

fn strip_bullet(text: &str) -> Option<&str> {
    text.strip_prefix("\u{2022} ")
        .or_else(|| text.strip_prefix("- "))
}

/// Splits `"12. rest"` into `("12", "rest")`.
fn strip_number(text: &str) -> Option<(&str, &str)> {
    let digits = text.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = text[digits..].strip_prefix(". ")?;
    Some((&text[..digits], rest))
}
