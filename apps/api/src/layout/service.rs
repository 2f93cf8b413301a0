//! Layout orchestration: sizing, packing, projection and editor overrides.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::layout::coords::{CoordinateMapper, PagePosition, ROUND_TRIP_EPSILON};
use crate::layout::dimensions::{compute, estimate_box_height};
use crate::layout::model::{ContentBox, LayoutEntry, LayoutOverride, PlacedBox, SizedBox, Warning};
use crate::layout::packer::{layout_order, pack, verify_placements, ShelfPacker};
use crate::layout::policy::LayoutPolicy;
use crate::layout::LayoutError;

/// Placement of every box of one request, in page space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutPlan {
    pub placed: Vec<PlacedBox>,
    pub page_count: u32,
    pub warnings: Vec<Warning>,
}

impl LayoutPlan {
    fn new(placed: Vec<PlacedBox>, warnings: Vec<Warning>) -> Self {
        let page_count = placed
            .iter()
            .map(|p| p.page.saturating_add(1))
            .max()
            .unwrap_or(0);
        Self {
            placed,
            page_count,
            warnings,
        }
    }

    /// Pages that actually carry boxes, ascending.
    pub fn pages(&self) -> Vec<u32> {
        let mut pages: Vec<u32> = self.placed.iter().map(|p| p.page).collect();
        pages.sort_unstable();
        pages.dedup();
        pages
    }
}

pub struct LayoutService {
    policy: LayoutPolicy,
    mapper: CoordinateMapper,
}

impl LayoutService {
    pub fn new(policy: LayoutPolicy) -> Result<Self, LayoutError> {
        policy.validate()?;
        let mapper = CoordinateMapper::new(&policy);
        Ok(Self { policy, mapper })
    }

    pub fn policy(&self) -> &LayoutPolicy {
        &self.policy
    }

    /// Sizes every box in input order.
    pub fn size_boxes(&self, boxes: &[ContentBox]) -> Vec<SizedBox> {
        boxes
            .iter()
            .enumerate()
            .map(|(i, b)| compute(i, b, &self.policy))
            .collect()
    }

    /// Sorts by category then id, sizes, packs, and checks the result.
    pub fn auto_layout(&self, boxes: &[ContentBox]) -> Result<LayoutPlan, LayoutError> {
        if boxes.is_empty() {
            return Err(LayoutError::NoContent);
        }

        let sized: Vec<SizedBox> = layout_order(boxes)
            .into_iter()
            .map(|i| compute(i, &boxes[i], &self.policy))
            .collect();
        let placed = pack(&sized, &self.policy.page)?;

        verify_placements(&placed, &self.policy.page)?;
        self.mapper.verify_round_trip(&placed)?;

        let plan = LayoutPlan::new(placed, Vec::new());
        debug!(boxes = boxes.len(), pages = plan.page_count, "auto layout complete");
        Ok(plan)
    }

    pub fn display_entries(&self, plan: &LayoutPlan) -> Vec<LayoutEntry> {
        plan.placed.iter().map(|p| self.mapper.to_display(p)).collect()
    }

    /// Editor preview: full box height in pixels for `content` in a box
    /// `display_width` pixels wide. Empty content has no height.
    pub fn estimate_height(&self, content: &str, display_width: f64) -> f64 {
        if content.is_empty() {
            return 0.0;
        }
        let width = self.mapper.width_to_page(display_width);
        let height = estimate_box_height(content, width, &self.policy);
        self.mapper.height_to_display(height)
    }

    /// Uses editor-supplied geometry instead of packing.
    ///
    /// Every override is mapped back to page space and clamped into the printable
    /// area. Boxes without an override are packed on fresh pages after the last
    /// page used by the overrides.
    pub fn apply_override(
        &self,
        boxes: &[ContentBox],
        overrides: &[LayoutOverride],
    ) -> Result<LayoutPlan, LayoutError> {
        if boxes.is_empty() {
            return Err(LayoutError::NoContent);
        }

        let mut warnings = Vec::new();
        let known: HashSet<&str> = boxes.iter().map(|b| b.id.as_str()).collect();

        let mut by_id: HashMap<&str, &LayoutOverride> = HashMap::new();
        for entry in overrides {
            if !known.contains(entry.id.as_str()) {
                warn!(id = %entry.id, "layout entry for unknown box");
                warnings.push(Warning::UnknownOverride {
                    id: entry.id.clone(),
                });
            } else if by_id.contains_key(entry.id.as_str()) {
                warn!(id = %entry.id, "duplicate layout entry ignored");
                warnings.push(Warning::DuplicateOverride {
                    id: entry.id.clone(),
                });
            } else {
                by_id.insert(entry.id.as_str(), entry);
            }
        }

        // n boxes never need more than n pages.
        let last_page = u32::try_from(boxes.len() - 1).unwrap_or(u32::MAX);

        let mut placed = Vec::with_capacity(boxes.len());
        let mut missing = Vec::new();
        for (i, content_box) in boxes.iter().enumerate() {
            match by_id.get(content_box.id.as_str()) {
                Some(entry) => {
                    let raw = self.mapper.override_to_page(entry);
                    let (position, clamped) = self.clamp(raw, last_page);
                    if clamped {
                        warn!(id = %content_box.id, "layout entry clamped to printable area");
                        warnings.push(Warning::OverrideClamped {
                            id: content_box.id.clone(),
                        });
                    }
                    placed.push(PlacedBox {
                        source: i,
                        id: content_box.id.clone(),
                        page: position.page,
                        x: position.x,
                        y: position.y,
                        width: position.width,
                        height: position.height,
                    });
                }
                None => missing.push(i),
            }
        }

        if !missing.is_empty() {
            let first_free = placed
                .iter()
                .map(|p| p.page.saturating_add(1))
                .max()
                .unwrap_or(0);
            let mut packer = ShelfPacker::starting_at(&self.policy.page, first_free);

            let subset: Vec<ContentBox> = missing.iter().map(|&i| boxes[i].clone()).collect();
            for k in layout_order(&subset) {
                let source = missing[k];
                warn!(id = %boxes[source].id, "no layout entry, packing automatically");
                warnings.push(Warning::MissingOverride {
                    id: boxes[source].id.clone(),
                });
                let sized = compute(source, &boxes[source], &self.policy);
                placed.push(packer.place(&sized)?);
            }
        }

        let plan = LayoutPlan::new(placed, warnings);
        debug!(
            boxes = boxes.len(),
            pages = plan.page_count,
            warnings = plan.warnings.len(),
            "override layout applied"
        );
        Ok(plan)
    }

    /// Pulls a page-space rectangle into the printable area of a page no later
    /// than `last_page`. Returns whether anything moved by more than the
    /// round-trip tolerance.
    fn clamp(&self, raw: PagePosition, last_page: u32) -> (PagePosition, bool) {
        let page = &self.policy.page;
        let t = &self.policy.typography;
        let min_height = t.header_height + 2.0 * t.box_padding;

        let finite_or = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };

        let width = finite_or(raw.width, t.min_box_width)
            .min(page.usable_width())
            .max(t.min_box_width);
        let height = finite_or(raw.height, min_height)
            .min(page.usable_height())
            .max(min_height);
        let x = finite_or(raw.x, page.margin)
            .min(page.right() - width)
            .max(page.margin);
        let y = finite_or(raw.y, page.top())
            .max(page.bottom() + height)
            .min(page.top());

        let moved = |a: f64, b: f64| !(a - b).abs().le(&ROUND_TRIP_EPSILON);
        let page_index = raw.page.min(last_page);
        let clamped = page_index != raw.page
            || moved(raw.x, x)
            || moved(raw.y, y)
            || moved(raw.width, width)
            || moved(raw.height, height);

        let position = PagePosition {
            page: page_index,
            x,
            y,
            width,
            height,
        };
        (position, clamped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> LayoutService {
        LayoutService::new(LayoutPolicy::default()).unwrap()
    }

    fn sample_boxes() -> Vec<ContentBox> {
        let mut boxes = Vec::new();
        for (cat, n) in [('C', 4), ('A', 6), ('B', 5), ('E', 3), ('D', 4)] {
            for i in 1..=n {
                let body = (0..(i * 3))
                    .map(|k| format!("- **Point {k}**: detail about item {k} of {cat}{i}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                boxes.push(ContentBox::new(format!("{cat}{i}"), format!("Topic {cat}{i}"), body));
            }
        }
        boxes
    }

    #[test]
    fn test_empty_box_list_is_no_content() {
        let svc = service();
        assert!(matches!(svc.auto_layout(&[]), Err(LayoutError::NoContent)));
        assert!(matches!(svc.apply_override(&[], &[]), Err(LayoutError::NoContent)));
    }

    #[test]
    fn test_invalid_policy_is_rejected_at_construction() {
        let mut policy = LayoutPolicy::default();
        policy.page.margin = policy.page.width;
        assert!(LayoutService::new(policy).is_err());
    }

    #[test]
    fn test_auto_layout_sorts_by_category_then_id() {
        let svc = service();
        let plan = svc.auto_layout(&sample_boxes()).unwrap();
        let ids: Vec<&str> = plan.placed.iter().map(|p| p.id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort_by_key(|id| (id.chars().next(), id.to_string()));
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_relayout_is_idempotent() {
        let svc = service();
        let boxes = sample_boxes();
        let first = svc.auto_layout(&boxes).unwrap();
        let second = svc.auto_layout(&boxes).unwrap();
        assert_eq!(first.page_count, second.page_count);
        assert_eq!(first.placed, second.placed);
        assert_eq!(svc.display_entries(&first), svc.display_entries(&second));
    }

    #[test]
    fn test_auto_layout_source_indexes_input() {
        let svc = service();
        let boxes = sample_boxes();
        let plan = svc.auto_layout(&boxes).unwrap();
        for p in &plan.placed {
            assert_eq!(boxes[p.source].id, p.id);
        }
        assert_eq!(plan.placed.len(), boxes.len());
    }

    #[test]
    fn test_oversize_box_reports_id() {
        let svc = service();
        let huge = "line\n".repeat(400);
        let boxes = vec![
            ContentBox::new("A1", "Fine", "ok"),
            ContentBox::new("B7", "Huge", huge),
        ];
        match svc.auto_layout(&boxes) {
            Err(LayoutError::BoxTooLarge { id, .. }) => assert_eq!(id, "B7"),
            other => panic!("expected BoxTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn test_box_size_does_not_depend_on_input_order() {
        let svc = service();
        let boxes = sample_boxes();
        let mut reversed = boxes.clone();
        reversed.reverse();

        let forward = svc.size_boxes(&boxes);
        let backward = svc.size_boxes(&reversed);
        for sized in &forward {
            let other = backward.iter().find(|s| s.id == sized.id).unwrap();
            assert_eq!(sized.width, other.width);
            assert_eq!(sized.height, other.height);
        }
    }

    #[test]
    fn test_estimate_height_only_empty_content_is_zero() {
        let svc = service();
        assert_eq!(svc.estimate_height("", 100.0), 0.0);

        let t = &svc.policy().typography;
        let whitespace = svc.estimate_height("  ", 100.0);
        let expected = svc
            .mapper
            .height_to_display(t.header_height + t.blank_line_height + 2.0 * t.box_padding);
        assert!(
            (whitespace - expected).abs() < 1e-9,
            "whitespace-only content is one blank line: {whitespace} vs {expected}"
        );
    }

    #[test]
    fn test_estimate_height_matches_layout_height() {
        let svc = service();
        let boxes = sample_boxes();
        let plan = svc.auto_layout(&boxes).unwrap();
        let entries = svc.display_entries(&plan);
        for (p, entry) in plan.placed.iter().zip(&entries) {
            let preview = svc.estimate_height(&boxes[p.source].content, entry.width);
            assert!(
                (preview - entry.height).abs() < 1e-6,
                "{}: preview {preview} vs layout {}",
                p.id,
                entry.height
            );
        }
    }

    #[test]
    fn test_override_round_trips_auto_layout() {
        let svc = service();
        let boxes = sample_boxes();
        let plan = svc.auto_layout(&boxes).unwrap();
        let overrides: Vec<LayoutOverride> = svc
            .display_entries(&plan)
            .into_iter()
            .map(|e| LayoutOverride {
                id: e.id,
                x: e.x,
                y: e.y,
                width: e.width,
                height: e.height,
            })
            .collect();

        let applied = svc.apply_override(&boxes, &overrides).unwrap();
        assert!(applied.warnings.is_empty(), "{:?}", applied.warnings);
        assert_eq!(applied.page_count, plan.page_count);
        for auto in &plan.placed {
            let o = applied.placed.iter().find(|p| p.id == auto.id).unwrap();
            assert_eq!(o.page, auto.page);
            assert!((o.x - auto.x).abs() < ROUND_TRIP_EPSILON);
            assert!((o.y - auto.y).abs() < ROUND_TRIP_EPSILON);
        }
    }

    #[test]
    fn test_override_is_clamped_to_printable_area() {
        let svc = service();
        let page = svc.policy().page.clone();
        let boxes = vec![ContentBox::new("A1", "Wide", "text")];
        let overrides = vec![LayoutOverride {
            id: "A1".into(),
            x: -10.0,
            y: 50.0,
            width: 9999.0,
            height: 100.0,
        }];
        let plan = svc.apply_override(&boxes, &overrides).unwrap();
        let p = &plan.placed[0];
        assert!(p.x >= page.margin);
        assert!(p.x + p.width <= page.right() + 1e-9);
        assert!(p.y - p.height >= page.bottom());
        assert!(p.y <= page.top());
        assert_eq!(
            plan.warnings,
            vec![Warning::OverrideClamped { id: "A1".into() }]
        );
    }

    #[test]
    fn test_override_non_finite_values_are_clamped() {
        let svc = service();
        let boxes = vec![ContentBox::new("A1", "T", "text")];
        let overrides = vec![LayoutOverride {
            id: "A1".into(),
            x: f64::NAN,
            y: 10.0,
            width: f64::INFINITY,
            height: 50.0,
        }];
        let plan = svc.apply_override(&boxes, &overrides).unwrap();
        let p = &plan.placed[0];
        assert!(p.x.is_finite() && p.width.is_finite());
        assert!(matches!(plan.warnings[0], Warning::OverrideClamped { .. }));
    }

    #[test]
    fn test_override_warnings_for_missing_unknown_and_duplicate() {
        let svc = service();
        let boxes = vec![
            ContentBox::new("A1", "One", "alpha"),
            ContentBox::new("B1", "Two", "beta"),
        ];
        let a1 = LayoutOverride {
            id: "A1".into(),
            x: 20.0,
            y: 900.0,
            width: 200.0,
            height: 60.0,
        };
        let overrides = vec![
            a1.clone(),
            LayoutOverride { x: 400.0, ..a1.clone() },
            LayoutOverride { id: "Z9".into(), ..a1 },
        ];

        let plan = svc.apply_override(&boxes, &overrides).unwrap();
        assert!(plan.warnings.contains(&Warning::DuplicateOverride { id: "A1".into() }));
        assert!(plan.warnings.contains(&Warning::UnknownOverride { id: "Z9".into() }));
        assert!(plan.warnings.contains(&Warning::MissingOverride { id: "B1".into() }));

        let a = plan.placed.iter().find(|p| p.id == "A1").unwrap();
        let b = plan.placed.iter().find(|p| p.id == "B1").unwrap();
        assert_eq!(a.page, 1, "y=900 is on the second display page");
        assert_eq!(b.page, 2, "missing boxes start after the last override page");
        assert_eq!(b.x, svc.policy().page.margin);
        assert_eq!(plan.page_count, 3);
        assert_eq!(plan.pages(), vec![1, 2]);
    }

    #[test]
    fn test_override_far_below_the_sheet_is_pulled_onto_a_real_page() {
        let svc = service();
        let boxes = vec![
            ContentBox::new("A1", "One", "alpha"),
            ContentBox::new("B1", "Two", "beta"),
        ];
        let overrides = vec![LayoutOverride {
            id: "A1".into(),
            x: 20.0,
            y: 1e15,
            width: 200.0,
            height: 60.0,
        }];

        let plan = svc.apply_override(&boxes, &overrides).unwrap();
        let a = plan.placed.iter().find(|p| p.id == "A1").unwrap();
        let b = plan.placed.iter().find(|p| p.id == "B1").unwrap();
        assert_eq!(a.page, 1, "two boxes never need more than two pages");
        assert!(a.y <= svc.policy().page.top());
        assert!(a.y - a.height >= svc.policy().page.bottom());
        assert_eq!(b.page, 2);
        assert_eq!(plan.page_count, 3);
        assert!(plan.warnings.contains(&Warning::OverrideClamped { id: "A1".into() }));
    }
}
