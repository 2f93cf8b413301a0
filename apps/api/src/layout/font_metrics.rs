//! Static glyph-width tables for the three standard PDF fonts the sheet uses.
//!
//! Widths are in thousandths of an em, exactly as published in the Adobe core-14
//! AFM files. Measuring sums the integer widths first and scales once, so two calls
//! with the same `(text, font, size)` always return bit-identical results no matter
//! which request (editor preview or final render) asks.
//!
//! All tables cover ASCII 0x20..=0x7E (95 printable characters).
//! Index = (char as usize) - 32.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::layout::LayoutError;

// ────────────────────────────────────────────────────────────────────────────
// Font faces
// ────────────────────────────────────────────────────────────────────────────

/// The font faces a sheet can be laid out with.
///
/// Every face is one of the PDF standard Type1 fonts, so the renderer never has to
/// embed font programs and the metric tables below are authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFace {
    Helvetica,
    HelveticaBold,
    Courier,
}

impl FontFace {
    /// The PostScript name written as `/BaseFont` in the PDF font dictionary.
    pub fn postscript_name(self) -> &'static str {
        match self {
            FontFace::Helvetica => "Helvetica",
            FontFace::HelveticaBold => "Helvetica-Bold",
            FontFace::Courier => "Courier",
        }
    }
}

impl fmt::Display for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.postscript_name())
    }
}

impl FromStr for FontFace {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "helvetica" => Ok(FontFace::Helvetica),
            "helvetica-bold" | "helveticabold" => Ok(FontFace::HelveticaBold),
            "courier" => Ok(FontFace::Courier),
            _ => Err(LayoutError::UnknownFont(s.to_string())),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

/// Static character-width table for a font face.
///
/// Width array slot layout:
/// ```text
/// [0]=sp  [1]=!   [2]="   [3]=#   [4]=$   [5]=%   [6]=&   [7]='
/// [8]=(   [9]=)   [10]=*  [11]=+  [12]=,  [13]=-  [14]=.  [15]=/
/// [16..25]=0-9
/// [26]=:  [27]=;  [28]=<  [29]==  [30]=>  [31]=?  [32]=@
/// [33..58]=A-Z
/// [59]=[  [60]=\  [61]=]  [62]=^  [63]=_  [64]=`
/// [65..90]=a-z
/// [91]={  [92]=|  [93]=}  [94]=~
/// ```
pub struct FontMetricTable {
    widths: [u16; 95],
    /// Widths for the handful of non-ASCII glyphs sheet content actually uses.
    extras: &'static [(char, u16)],
    /// Width for every other codepoint.
    pub fallback_width: u16,
}

impl FontMetricTable {
    /// Width of a single character in thousandths of an em.
    pub fn char_units(&self, c: char) -> u16 {
        let code = c as usize;
        if (32..=126).contains(&code) {
            return self.widths[code - 32];
        }
        self.extras
            .iter()
            .find(|(ch, _)| *ch == c)
            .map(|(_, w)| *w)
            .unwrap_or(self.fallback_width)
    }

    /// Total width of a string in thousandths of an em.
    pub fn measure_units(&self, s: &str) -> u64 {
        s.chars().map(|c| u64::from(self.char_units(c))).sum()
    }

    /// Rendered width of a string in points at `size`.
    pub fn measure_str(&self, s: &str, size: f64) -> f64 {
        self.measure_units(s) as f64 * size / 1000.0
    }
}

/// Measures `text` set in `font` at `size` points. Result is in points.
pub fn measure(text: &str, font: FontFace, size: f64) -> f64 {
    get_metrics(font).measure_str(text, size)
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables  (95 ASCII printable characters each)
// ────────────────────────────────────────────────────────────────────────────

static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0    1    2    3    4    5    6    7    8    9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // :    ;    <    =    >    ?    @
        278, 278, 584, 584, 584, 556, 1015,
        // A    B    C    D    E    F    G    H    I    J    K    L    M
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
        // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [    \    ]    ^    _    `
        278, 278, 278, 469, 556, 333,
        // a    b    c    d    e    f    g    h    i    j    k    l    m
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
        // n    o    p    q    r    s    t    u    v    w    x    y    z
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
        // {    |    }    ~
        334, 260, 334, 584,
    ],
    extras: &[
        ('\u{2022}', 350),  // bullet
        ('\u{2013}', 556),  // en dash
        ('\u{2014}', 1000), // em dash
        ('\u{2018}', 222),
        ('\u{2019}', 222),
        ('\u{201C}', 333),
        ('\u{201D}', 333),
        ('\u{2026}', 1000), // ellipsis
        ('\u{00D7}', 584),  // multiplication sign
        ('\u{00A0}', 278),  // no-break space
    ],
    fallback_width: 556,
};

static HELVETICA_BOLD_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0    1    2    3    4    5    6    7    8    9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // :    ;    <    =    >    ?    @
        333, 333, 584, 584, 584, 611, 975,
        // A    B    C    D    E    F    G    H    I    J    K    L    M
        722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
        // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [    \    ]    ^    _    `
        333, 278, 333, 584, 556, 333,
        // a    b    c    d    e    f    g    h    i    j    k    l    m
        556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
        // n    o    p    q    r    s    t    u    v    w    x    y    z
        611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
        // {    |    }    ~
        389, 280, 389, 584,
    ],
    extras: &[
        ('\u{2022}', 350),
        ('\u{2013}', 556),
        ('\u{2014}', 1000),
        ('\u{2018}', 278),
        ('\u{2019}', 278),
        ('\u{201C}', 500),
        ('\u{201D}', 500),
        ('\u{2026}', 1000),
        ('\u{00D7}', 584),
        ('\u{00A0}', 278),
    ],
    fallback_width: 611,
};

/// Courier is monospaced: every glyph is 600 units.
static COURIER_TABLE: FontMetricTable = FontMetricTable {
    widths: [600; 95],
    extras: &[],
    fallback_width: 600,
};

/// Returns the static metric table for a given font face.
pub fn get_metrics(font: FontFace) -> &'static FontMetricTable {
    match font {
        FontFace::Helvetica => &HELVETICA_TABLE,
        FontFace::HelveticaBold => &HELVETICA_BOLD_TABLE,
        FontFace::Courier => &COURIER_TABLE,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
