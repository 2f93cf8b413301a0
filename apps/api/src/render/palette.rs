use std::collections::HashMap;

use crate::layout::model::FALLBACK_CATEGORY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels scaled to `0.0..=1.0` for PDF color operators.
    pub fn components(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }
}

/// Category to header/border color map. Built once and shared read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: HashMap<char, Rgb>,
    fallback: Rgb,
}

impl Palette {
    /// A palette from explicit colors. Categories without a color use the
    /// `FALLBACK_CATEGORY` color, or black if that is missing too.
    pub fn new(colors: impl IntoIterator<Item = (char, Rgb)>) -> Self {
        let colors: HashMap<char, Rgb> = colors.into_iter().collect();
        let fallback = colors
            .get(&FALLBACK_CATEGORY)
            .copied()
            .unwrap_or(Rgb::BLACK);
        Self { colors, fallback }
    }

    pub fn color_for(&self, category: char) -> Rgb {
        self.colors.get(&category).copied().unwrap_or(self.fallback)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new([
            ('A', Rgb::new(0x0d, 0x73, 0x77)), // teal
            ('B', Rgb::new(0x1a, 0x52, 0x76)), // blue
            ('C', Rgb::new(0x7d, 0x66, 0x08)), // olive
            ('D', Rgb::new(0x6c, 0x34, 0x83)), // purple
            ('E', Rgb::new(0x92, 0x2b, 0x21)), // red
        ])
    }
}
