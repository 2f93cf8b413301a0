// Layout core: text measurement, content classification, box sizing, greedy shelf
// packing and the page <-> display coordinate mapping.
// Everything here is synchronous and request-scoped. Handlers run it inside
// tokio::task::spawn_blocking.

pub mod classify;
pub mod coords;
pub mod dimensions;
pub mod estimate;
pub mod font_metrics;
pub mod model;
pub mod packer;
pub mod policy;
pub mod service;

use thiserror::Error;

// Re-export the public API consumed by handlers and the renderer.
pub use font_metrics::FontFace;
pub use model::{ContentBox, LayoutEntry, LayoutOverride, PlacedBox, Rect, Warning};
pub use policy::{default_layout_policy, FontSet, LayoutPolicy};
pub use service::{LayoutPlan, LayoutService};

/// Failures of the layout core.
///
/// `NoContent` and `BoxTooLarge` are caused by input; `UnknownFont` and
/// `InvalidPolicy` by configuration; `Invariant` always means a bug in this module.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("no content boxes to lay out")]
    NoContent,

    #[error("box {id} needs {width:.1}x{height:.1}pt and cannot fit on an empty page")]
    BoxTooLarge { id: String, width: f64, height: f64 },

    #[error("unknown font '{0}' (expected Helvetica, Helvetica-Bold or Courier)")]
    UnknownFont(String),

    #[error("invalid layout policy: {0}")]
    InvalidPolicy(String),

    #[error("layout invariant violated: {0}")]
    Invariant(String),
}
