//! Box dimension calculation.

use crate::layout::estimate::{estimate_height, estimate_min_width};
use crate::layout::model::{ContentBox, SizedBox};
use crate::layout::policy::LayoutPolicy;

/// Full box height (header, wrapped content, padding) at a given width.
pub fn estimate_box_height(content: &str, width: f64, policy: &LayoutPolicy) -> f64 {
    let t = &policy.typography;
    t.header_height + estimate_height(content, width, policy) + t.box_padding * 2.0
}

/// Sizes one box. The result depends only on the box and the policy, never on
/// the other boxes in the request or their order.
pub fn compute(source: usize, content_box: &ContentBox, policy: &LayoutPolicy) -> SizedBox {
    let width = estimate_min_width(content_box, policy);
    let height = estimate_box_height(&content_box.content, width, policy);
    SizedBox {
        source,
        id: content_box.id.clone(),
        width,
        height,
    }
}
