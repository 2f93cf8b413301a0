use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::layout::LayoutError;
use crate::llm_client::LlmError;
use crate::render::RenderError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("AI generation is disabled (ANTHROPIC_API_KEY is not set)")]
    GenerationDisabled,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Layout(e) => match e {
                LayoutError::NoContent => (
                    StatusCode::BAD_REQUEST,
                    "NO_CONTENT",
                    "No boxes found in AI output. Check the format.".to_string(),
                ),
                LayoutError::BoxTooLarge { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "BOX_TOO_LARGE", e.to_string())
                }
                LayoutError::Invariant(msg) => {
                    tracing::error!("Layout invariant violated: {msg}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_INVARIANT",
                        "An internal layout error occurred".to_string(),
                    )
                }
                LayoutError::UnknownFont(_) | LayoutError::InvalidPolicy(_) => {
                    tracing::error!("Layout configuration error: {e}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "CONFIGURATION_ERROR",
                        "The layout engine is misconfigured".to_string(),
                    )
                }
            },
            AppError::Render(e) => {
                tracing::error!("Render error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RENDER_ERROR",
                    "Failed to render the PDF".to_string(),
                )
            }
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::GenerationDisabled => (
                StatusCode::SERVICE_UNAVAILABLE,
                "GENERATION_DISABLED",
                self.to_string(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_errors_map_to_distinct_codes() {
        let (status, code, _) = AppError::from(LayoutError::NoContent).parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "NO_CONTENT");

        let (status, code, _) = AppError::from(LayoutError::Invariant("overlap".into())).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "INTERNAL_INVARIANT");

        let (_, code, _) = AppError::from(LayoutError::UnknownFont("Comic".into())).parts();
        assert_eq!(code, "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_box_too_large_message_names_the_box() {
        let err = AppError::from(LayoutError::BoxTooLarge {
            id: "E9".into(),
            width: 400.0,
            height: 900.0,
        });
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(code, "BOX_TOO_LARGE");
        assert!(message.contains("E9"), "message was: {message}");
    }

    #[test]
    fn test_generation_disabled_is_503() {
        let (status, code, _) = AppError::GenerationDisabled.parts();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(code, "GENERATION_DISABLED");
    }

    #[test]
    fn test_llm_error_is_bad_gateway() {
        let (status, code, _) = AppError::from(LlmError::EmptyContent).parts();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(code, "LLM_ERROR");
    }
}
