//! Axum route handlers for the Generation API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::generation::extract::LectureMaterial;
use crate::generation::prompts::{build_prompt, build_topic_format_prompt, combined_prompt};
use crate::layout::LayoutError;
use crate::sheet::handlers::{build_layout_response, run_blocking, LayoutResponse};
use crate::sheet::parser::{parse_boxes, topic_ids, validate_coverage, CoverageReport};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PromptResponse {
    pub prompt: String,
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct FormatTopicsRequest {
    pub raw_topics: String,
}

#[derive(Debug, Serialize)]
pub struct FormatTopicsResponse {
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub topics: Vec<String>,
    pub lecture_content: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub ai_output: String,
    #[serde(flatten)]
    pub sheet: LayoutResponse,
    pub coverage: CoverageReport,
}

/// Non-empty trimmed lines.
pub fn parse_topics(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("invalid multipart body: {e}"))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/prompt
///
/// Multipart form: `topics` (one per line), `manual_content`, and any number of
/// `files`. Returns the combined system + user prompt for copy-paste use.
/// Unreadable uploads are skipped and reported in `warnings`.
pub async fn handle_prompt(mut multipart: Multipart) -> Result<Json<PromptResponse>, AppError> {
    let mut topics_raw = String::new();
    let mut manual_content = String::new();
    let mut material = LectureMaterial::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "topics" => topics_raw = field.text().await.map_err(multipart_error)?,
            "manual_content" => manual_content = field.text().await.map_err(multipart_error)?,
            "files" => {
                let Some(filename) = field.file_name().map(str::to_string) else {
                    continue;
                };
                if filename.is_empty() {
                    continue;
                }
                let bytes = field.bytes().await.map_err(multipart_error)?;
                material.add_upload(&filename, bytes).await;
            }
            _ => {}
        }
    }

    let topics = parse_topics(&topics_raw);
    if topics.is_empty() {
        return Err(AppError::Validation("No topics provided".to_string()));
    }

    material.add_manual_notes(&manual_content);
    if material.is_empty() {
        return Err(AppError::Validation(
            "No lecture content provided (upload files or paste text)".to_string(),
        ));
    }

    let (system, user) = build_prompt(&topics, &material.combined());

    Ok(Json(PromptResponse {
        prompt: combined_prompt(&system, &user),
        warnings: material.warnings,
    }))
}

/// POST /api/v1/topics/format-prompt
///
/// Returns a prompt that turns free-form learning objectives into `A1: ...` lines.
pub async fn handle_format_topics(
    Json(request): Json<FormatTopicsRequest>,
) -> Result<Json<FormatTopicsResponse>, AppError> {
    if request.raw_topics.trim().is_empty() {
        return Err(AppError::Validation("raw_topics cannot be empty".to_string()));
    }

    Ok(Json(FormatTopicsResponse {
        prompt: build_topic_format_prompt(&request.raw_topics),
    }))
}

/// POST /api/v1/sheets/generate
///
/// Full pipeline: prompt, LLM call, parse, auto layout.
/// Answers 503 when no API key is configured.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let generator = state.generator.clone().ok_or(AppError::GenerationDisabled)?;

    let topics: Vec<String> = request
        .topics
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if topics.is_empty() {
        return Err(AppError::Validation("topics cannot be empty".to_string()));
    }
    if request.lecture_content.trim().is_empty() {
        return Err(AppError::Validation(
            "lecture_content cannot be empty".to_string(),
        ));
    }

    let (system, user) = build_prompt(&topics, &request.lecture_content);
    let ai_output = generator.generate(&system, &user).await?;
    info!(topics = topics.len(), chars = ai_output.len(), "sheet text generated");

    let service = state.layout.clone();
    let raw = ai_output.clone();
    let (sheet, coverage) = run_blocking("generate layout", move || {
        let parsed = parse_boxes(&raw);
        if parsed.boxes.is_empty() {
            return Err(LayoutError::NoContent.into());
        }
        let coverage = validate_coverage(&parsed.boxes, &topic_ids(&topics));
        let sheet = build_layout_response(&service, parsed)?;
        Ok((sheet, coverage))
    })
    .await?;

    Ok(Json(GenerateResponse {
        ai_output,
        sheet,
        coverage,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_topics_skips_blank_lines() {
        let topics = parse_topics("  A1: Intro \n\n\tB1: Risk\n   \n");
        assert_eq!(topics, vec!["A1: Intro", "B1: Risk"]);
    }

    #[test]
    fn test_parse_topics_empty() {
        assert!(parse_topics("\n  \n").is_empty());
    }
}
