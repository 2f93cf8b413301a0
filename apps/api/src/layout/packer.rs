//! Greedy shelf packer.
//!
//! Boxes are placed one at a time, first fit, with no backtracking. For each box
//! the packer scans candidate shelves (the top margin and the bottom edge of every
//! box already on the page) from top to bottom, and within the first shelf that
//! admits the box it takes the leftmost candidate X (the left margin and the right
//! edge plus gap of every placed box). When nothing on the current page fits, the
//! box opens a new page at the top-left margin.
//!
//! Same boxes in the same order always give the same placements. Changing only
//! the input order may change the result.

use std::cmp::Ordering;

use tracing::debug;

use crate::layout::model::{category, ContentBox, PlacedBox, Rect, SizedBox};
use crate::layout::policy::PageConfig;
use crate::layout::LayoutError;

/// Slack on the page-edge checks. Two maximum-width boxes plus a gap sum to the
/// usable width only up to rounding.
const EDGE_EPSILON: f64 = 1e-9;

pub struct ShelfPacker<'a> {
    page: &'a PageConfig,
    page_index: u32,
    /// Boxes on the current page only.
    on_page: Vec<Rect>,
}

impl<'a> ShelfPacker<'a> {
    pub fn new(page: &'a PageConfig) -> Self {
        Self::starting_at(page, 0)
    }

    /// A packer whose first page is `page_index`. Used to pack boxes after pages
    /// already filled by other means.
    pub fn starting_at(page: &'a PageConfig, page_index: u32) -> Self {
        Self {
            page,
            page_index,
            on_page: Vec::new(),
        }
    }

    /// Places one box, opening a new page when the current one has no room.
    pub fn place(&mut self, sized: &SizedBox) -> Result<PlacedBox, LayoutError> {
        if !self.fits_empty_page(sized.width, sized.height) {
            return Err(LayoutError::BoxTooLarge {
                id: sized.id.clone(),
                width: sized.width,
                height: sized.height,
            });
        }

        let (x, y) = match self.find_position(sized.width, sized.height) {
            Some(position) => position,
            None => {
                self.page_index = self.page_index.saturating_add(1);
                self.on_page.clear();
                debug!(page = self.page_index, id = %sized.id, "starting new page");
                (self.page.margin, self.page.top())
            }
        };

        let placed = PlacedBox {
            source: sized.source,
            id: sized.id.clone(),
            page: self.page_index,
            x,
            y,
            width: sized.width,
            height: sized.height,
        };
        self.on_page.push(placed.rect());
        Ok(placed)
    }

    fn fits_empty_page(&self, width: f64, height: f64) -> bool {
        self.page.top() - height >= self.page.bottom() - EDGE_EPSILON
            && self.page.margin + width <= self.page.right() + EDGE_EPSILON
    }

    /// Topmost shelf first, then leftmost X within it.
    fn find_position(&self, width: f64, height: f64) -> Option<(f64, f64)> {
        let gap = self.page.column_gap;

        let mut shelves: Vec<f64> = std::iter::once(self.page.top())
            .chain(self.on_page.iter().map(Rect::bottom))
            .collect();
        shelves.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
        shelves.dedup();

        let mut columns: Vec<f64> = std::iter::once(self.page.margin)
            .chain(self.on_page.iter().map(|r| r.right() + gap))
            .collect();
        columns.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        columns.dedup();

        for &y in &shelves {
            if y - height < self.page.bottom() - EDGE_EPSILON {
                continue;
            }
            for &x in &columns {
                if x + width > self.page.right() + EDGE_EPSILON {
                    continue;
                }
                let candidate = Rect { x, y, width, height };
                if !self.on_page.iter().any(|r| candidate.overlaps_with_gap(r, gap)) {
                    return Some((x, y));
                }
            }
        }
        None
    }
}

/// Default packing order: indices of `boxes` sorted by category, then id.
pub fn layout_order(boxes: &[ContentBox]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..boxes.len()).collect();
    order.sort_by(|&a, &b| {
        (category(&boxes[a].id), &boxes[a].id).cmp(&(category(&boxes[b].id), &boxes[b].id))
    });
    order
}

/// Packs `sized` in the given order starting on page 0.
pub fn pack(sized: &[SizedBox], page: &PageConfig) -> Result<Vec<PlacedBox>, LayoutError> {
    let mut packer = ShelfPacker::new(page);
    sized.iter().map(|s| packer.place(s)).collect()
}

/// Checks bounds and pairwise gap-expanded overlap of every page.
///
/// A failure here is always a packer bug, never an input problem.
pub fn verify_placements(placed: &[PlacedBox], page: &PageConfig) -> Result<(), LayoutError> {
    for b in placed {
        let inside = b.x >= page.margin
            && b.x + b.width <= page.right() + EDGE_EPSILON
            && b.y - b.height >= page.bottom() - EDGE_EPSILON
            && b.y <= page.top();
        if !inside {
            return Err(LayoutError::Invariant(format!(
                "box {} on page {} lies outside the printable area",
                b.id, b.page
            )));
        }
    }

    for (i, a) in placed.iter().enumerate() {
        for b in placed[i + 1..].iter().filter(|b| b.page == a.page) {
            if a.rect().overlaps_with_gap(&b.rect(), page.column_gap) {
                return Err(LayoutError::Invariant(format!(
                    "boxes {} and {} overlap on page {}",
                    a.id, b.id, a.page
                )));
            }
        }
    }
    Ok(())
}
