//! Axum route handlers for the Sheet API.
//!
//! Parsing, layout and PDF rendering are CPU-bound and run via
//! `tokio::task::spawn_blocking`. Owned data moves into the closure; the
//! layout service and palette are shared through `Arc`.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::layout::{ContentBox, LayoutEntry, LayoutError, LayoutOverride, LayoutService, Warning};
use crate::render::render_pdf;
use crate::sheet::parser::{parse_boxes, ParsedSheet};
use crate::state::AppState;

const DEFAULT_PREVIEW_WIDTH: f64 = 100.0;
const PDF_FILENAME: &str = "cheatsheet.pdf";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SheetRequest {
    pub ai_output: String,
}

#[derive(Debug, Deserialize)]
pub struct RenderWithLayoutRequest {
    pub ai_output: String,
    #[serde(default)]
    pub layout: Vec<LayoutOverride>,
}

#[derive(Debug, Deserialize)]
pub struct EstimateHeightRequest {
    pub content: String,
    #[serde(default = "default_preview_width")]
    pub width: f64,
}

fn default_preview_width() -> f64 {
    DEFAULT_PREVIEW_WIDTH
}

#[derive(Debug, Serialize)]
pub struct EstimateHeightResponse {
    pub estimated_height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSummary {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: char,
}

impl From<&ContentBox> for BoxSummary {
    fn from(b: &ContentBox) -> Self {
        Self {
            id: b.id.clone(),
            title: b.title.clone(),
            content: b.content.clone(),
            category: b.category(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LayoutResponse {
    pub layout: Vec<LayoutEntry>,
    pub boxes: Vec<BoxSummary>,
    pub page_count: u32,
    pub warnings: Vec<Warning>,
}

// ────────────────────────────────────────────────────────────────────────────
// Shared steps
// ────────────────────────────────────────────────────────────────────────────

/// Runs CPU-bound work off the async executor.
pub(crate) async fn run_blocking<T, F>(what: &'static str, work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        AppError::Internal(anyhow::anyhow!("spawn_blocking failed in {what}: {e}"))
    })?
}

/// Parses `ai_output`, rejecting blank input and input without boxes.
pub(crate) fn parse_required(ai_output: &str) -> Result<ParsedSheet, AppError> {
    if ai_output.trim().is_empty() {
        return Err(AppError::Validation("ai_output cannot be empty".to_string()));
    }
    let parsed = parse_boxes(ai_output);
    if parsed.boxes.is_empty() {
        return Err(LayoutError::NoContent.into());
    }
    Ok(parsed)
}

/// Auto-lays out a parsed sheet and projects it for the editor.
pub(crate) fn build_layout_response(
    service: &LayoutService,
    parsed: ParsedSheet,
) -> Result<LayoutResponse, AppError> {
    let plan = service.auto_layout(&parsed.boxes)?;

    let mut warnings = parsed.warnings;
    warnings.extend(plan.warnings.iter().cloned());

    Ok(LayoutResponse {
        layout: service.display_entries(&plan),
        boxes: parsed.boxes.iter().map(BoxSummary::from).collect(),
        page_count: plan.page_count,
        warnings,
    })
}

fn pdf_response(bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{PDF_FILENAME}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sheets/layout
///
/// Parses delimited AI output and returns the automatic layout in display units.
pub async fn handle_layout(
    State(state): State<AppState>,
    Json(request): Json<SheetRequest>,
) -> Result<Json<LayoutResponse>, AppError> {
    let service = state.layout.clone();
    let response = run_blocking("layout", move || {
        let parsed = parse_required(&request.ai_output)?;
        build_layout_response(&service, parsed)
    })
    .await?;

    Ok(Json(response))
}

/// POST /api/v1/sheets/estimate-height
///
/// Editor preview: the height a box of `width` display pixels needs for `content`.
pub async fn handle_estimate_height(
    State(state): State<AppState>,
    Json(request): Json<EstimateHeightRequest>,
) -> Result<Json<EstimateHeightResponse>, AppError> {
    if !request.width.is_finite() || request.width <= 0.0 {
        return Err(AppError::Validation(
            "width must be a positive number".to_string(),
        ));
    }

    let estimated_height = state.layout.estimate_height(&request.content, request.width);
    Ok(Json(EstimateHeightResponse { estimated_height }))
}

/// POST /api/v1/sheets/render
///
/// Auto-lays out the boxes and returns the PDF.
pub async fn handle_render(
    State(state): State<AppState>,
    Json(request): Json<SheetRequest>,
) -> Result<Response, AppError> {
    let service = state.layout.clone();
    let palette = state.palette.clone();
    let bytes = run_blocking("render", move || {
        let parsed = parse_required(&request.ai_output)?;
        let plan = service.auto_layout(&parsed.boxes)?;
        Ok(render_pdf(&parsed.boxes, &plan, service.policy(), &palette, false)?)
    })
    .await?;

    Ok(pdf_response(bytes))
}

/// POST /api/v1/sheets/render-with-layout
///
/// Renders with geometry from the editor. Content is clipped to each box.
pub async fn handle_render_with_layout(
    State(state): State<AppState>,
    Json(request): Json<RenderWithLayoutRequest>,
) -> Result<Response, AppError> {
    let service = state.layout.clone();
    let palette = state.palette.clone();
    let bytes = run_blocking("render with layout", move || {
        let parsed = parse_required(&request.ai_output)?;
        let plan = service.apply_override(&parsed.boxes, &request.layout)?;
        Ok(render_pdf(&parsed.boxes, &plan, service.policy(), &palette, true)?)
    })
    .await?;

    Ok(pdf_response(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutPolicy;

    const TWO_BOXES: &str = "[BOX:B1]\n[TITLE:Second]\nbody\n[/BOX]\n\
                             [BOX:A1]\n[TITLE:First]\n• one\n• two\n[/BOX]";

    #[test]
    fn test_parse_required_rejects_blank_input() {
        assert!(matches!(parse_required("   \n"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_parse_required_rejects_input_without_boxes() {
        assert!(matches!(
            parse_required("no boxes here"),
            Err(AppError::Layout(LayoutError::NoContent))
        ));
    }

    #[test]
    fn test_layout_response_lists_boxes_in_input_order_and_layout_sorted() {
        let service = LayoutService::new(LayoutPolicy::default()).unwrap();
        let parsed = parse_required(TWO_BOXES).unwrap();
        let response = build_layout_response(&service, parsed).unwrap();

        let box_ids: Vec<&str> = response.boxes.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(box_ids, vec!["B1", "A1"]);
        assert_eq!(response.layout[0].id, "A1");
        assert_eq!(response.page_count, 1);
        assert_eq!(response.boxes[0].category, 'B');
        assert!(response.warnings.is_empty());
    }

    #[test]
    fn test_layout_response_carries_parse_warnings() {
        let service = LayoutService::new(LayoutPolicy::default()).unwrap();
        let parsed = parse_required("[BOX:a-1]\n[TITLE:Odd]\nx\n[/BOX]").unwrap();
        let response = build_layout_response(&service, parsed).unwrap();
        assert_eq!(response.warnings.len(), 1);
        assert_eq!(response.boxes[0].category, 'A');
    }

    #[tokio::test]
    async fn test_run_blocking_propagates_errors() {
        let result: Result<(), AppError> =
            run_blocking("test", || Err(AppError::Validation("bad".into()))).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
