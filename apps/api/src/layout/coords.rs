//! Page space <-> display space mapping.
//!
//! Page space: points, origin at the page's bottom-left corner, Y up, one page at a
//! time. Display space: pixels, origin at the top-left of a vertical strip in which
//! page `n` starts at `n * display.page_height`, Y down.

use crate::layout::model::{LayoutEntry, LayoutOverride, PlacedBox};
use crate::layout::policy::LayoutPolicy;
use crate::layout::LayoutError;

/// Round-trip tolerance in points.
pub const ROUND_TRIP_EPSILON: f64 = 1e-6;

/// Geometry of one box in page space. `y` is the top edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePosition {
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    page_height: f64,
    display_page_height: f64,
    scale_x: f64,
    scale_y: f64,
}

impl CoordinateMapper {
    pub fn new(policy: &LayoutPolicy) -> Self {
        Self {
            page_height: policy.page.height,
            display_page_height: policy.display.page_height,
            scale_x: policy.display.page_width / policy.page.width,
            scale_y: policy.display.page_height / policy.page.height,
        }
    }

    /// Converts a horizontal display length (pixels) to points.
    pub fn width_to_page(&self, display_width: f64) -> f64 {
        display_width / self.scale_x
    }

    /// Converts a vertical page length (points) to pixels.
    pub fn height_to_display(&self, height: f64) -> f64 {
        height * self.scale_y
    }

    pub fn to_display(&self, placed: &PlacedBox) -> LayoutEntry {
        LayoutEntry {
            id: placed.id.clone(),
            x: placed.x * self.scale_x,
            y: (self.page_height - placed.y) * self.scale_y
                + f64::from(placed.page) * self.display_page_height,
            width: placed.width * self.scale_x,
            height: placed.height * self.scale_y,
            page: placed.page,
        }
    }

    /// Page index implied by a display-space Y. Negative Y maps to page 0.
    pub fn page_of(&self, display_y: f64) -> u32 {
        let page = (display_y / self.display_page_height).floor();
        if page.is_finite() && page > 0.0 {
            page as u32
        } else {
            0
        }
    }

    /// Maps display geometry on a known page back to page space.
    pub fn to_page_on(&self, page: u32, x: f64, y: f64, width: f64, height: f64) -> PagePosition {
        let local_y = y - f64::from(page) * self.display_page_height;
        PagePosition {
            page,
            x: x / self.scale_x,
            y: self.page_height - local_y / self.scale_y,
            width: width / self.scale_x,
            height: height / self.scale_y,
        }
    }

    pub fn entry_to_page(&self, entry: &LayoutEntry) -> PagePosition {
        self.to_page_on(entry.page, entry.x, entry.y, entry.width, entry.height)
    }

    /// Maps an editor override back to page space; the page comes from its Y.
    pub fn override_to_page(&self, entry: &LayoutOverride) -> PagePosition {
        let page = self.page_of(entry.y);
        self.to_page_on(page, entry.x, entry.y, entry.width, entry.height)
    }

    /// Checks `to_page(to_display(p)) == p` for every placement.
    pub fn verify_round_trip(&self, placed: &[PlacedBox]) -> Result<(), LayoutError> {
        for p in placed {
            let entry = self.to_display(p);
            let derived_page = self.page_of(entry.y);
            let back = self.entry_to_page(&entry);
            let close = |a: f64, b: f64| (a - b).abs() <= ROUND_TRIP_EPSILON;
            let ok = derived_page == p.page
                && back.page == p.page
                && close(back.x, p.x)
                && close(back.y, p.y)
                && close(back.width, p.width)
                && close(back.height, p.height);
            if !ok {
                return Err(LayoutError::Invariant(format!(
                    "coordinate round trip failed for box {} on page {}",
                    p.id, p.page
                )));
            }
        }
        Ok(())
    }
}
