pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::generation::handlers as generation;
use crate::sheet::handlers as sheet;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Sheet API
        .route("/api/v1/sheets/layout", post(sheet::handle_layout))
        .route(
            "/api/v1/sheets/estimate-height",
            post(sheet::handle_estimate_height),
        )
        .route("/api/v1/sheets/render", post(sheet::handle_render))
        .route(
            "/api/v1/sheets/render-with-layout",
            post(sheet::handle_render_with_layout),
        )
        // Generation API
        .route("/api/v1/sheets/generate", post(generation::handle_generate))
        .route("/api/v1/prompt", post(generation::handle_prompt))
        .route(
            "/api/v1/topics/format-prompt",
            post(generation::handle_format_topics),
        )
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::generation::generator::fakes::CannedGenerator;
    use crate::generation::generator::SheetGenerator;

    const SHEET: &str = "[BOX:B1]\n[TITLE:Risk]\n• likelihood\n• impact\n[/BOX]\n\
                         [BOX:A1]\n[TITLE:Scope]\n**Scope**: what is in and out\n\n\
                         1. define\n2. verify\n[/BOX]";

    fn test_state(generator: Option<Arc<dyn SheetGenerator>>) -> AppState {
        let config = Config::from_lookup(|_| None).unwrap();
        AppState::new(config, generator).unwrap()
    }

    fn app() -> Router {
        build_router(test_state(None))
    }

    async fn post_json(
        app: Router,
        uri: &str,
        body: Value,
    ) -> (StatusCode, Vec<u8>, Option<String>) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec(), content_type)
    }

    fn json_of(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(json_of(&body)["service"], "cheatsheet-api");
    }

    #[tokio::test]
    async fn test_layout_endpoint() {
        let (status, body, _) =
            post_json(app(), "/api/v1/sheets/layout", json!({ "ai_output": SHEET })).await;
        assert_eq!(status, StatusCode::OK);

        let body = json_of(&body);
        assert_eq!(body["page_count"], 1);
        assert_eq!(body["layout"][0]["id"], "A1");
        assert_eq!(body["layout"][1]["id"], "B1");
        assert_eq!(body["boxes"][0]["id"], "B1");
        assert_eq!(body["boxes"][0]["category"], "B");
        assert!(body["warnings"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_layout_rejects_empty_output() {
        let (status, body, _) =
            post_json(app(), "/api/v1/sheets/layout", json!({ "ai_output": "  " })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_of(&body)["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_layout_without_boxes_is_no_content() {
        let (status, body, _) = post_json(
            app(),
            "/api/v1/sheets/layout",
            json!({ "ai_output": "The model forgot the delimiters." }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_of(&body)["error"]["code"], "NO_CONTENT");
    }

    #[tokio::test]
    async fn test_oversize_box_is_422_naming_the_box() {
        let lines: Vec<String> = (0..400).map(|i| format!("line {i}")).collect();
        let raw = format!("[BOX:C3]\n[TITLE:Huge]\n{}\n[/BOX]", lines.join("\n"));
        let (status, body, _) =
            post_json(app(), "/api/v1/sheets/layout", json!({ "ai_output": raw })).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_of(&body);
        assert_eq!(body["error"]["code"], "BOX_TOO_LARGE");
        assert!(body["error"]["message"].as_str().unwrap().contains("C3"));
    }

    #[tokio::test]
    async fn test_estimate_height_endpoint() {
        let (status, body, _) = post_json(
            app(),
            "/api/v1/sheets/estimate-height",
            json!({ "content": "• one\n• two", "width": 200.0 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(json_of(&body)["estimated_height"].as_f64().unwrap() > 0.0);

        let (_, body, _) = post_json(
            app(),
            "/api/v1/sheets/estimate-height",
            json!({ "content": "" }),
        )
        .await;
        assert_eq!(json_of(&body)["estimated_height"], 0.0);
    }

    #[tokio::test]
    async fn test_estimate_height_rejects_bad_width() {
        let (status, _, _) = post_json(
            app(),
            "/api/v1/sheets/estimate-height",
            json!({ "content": "x", "width": -5.0 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_render_returns_pdf() {
        let (status, body, content_type) =
            post_json(app(), "/api/v1/sheets/render", json!({ "ai_output": SHEET })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/pdf"));
        assert!(body.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_render_with_layout_accepts_out_of_range_geometry() {
        let (status, body, content_type) = post_json(
            app(),
            "/api/v1/sheets/render-with-layout",
            json!({
                "ai_output": SHEET,
                "layout": [
                    { "id": "A1", "x": -10.0, "y": 10.0, "width": 9999.0, "height": 120.0 },
                    { "id": "Z9", "x": 0.0, "y": 0.0, "width": 100.0, "height": 100.0 }
                ]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/pdf"));
        assert!(body.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_generate_without_api_key_is_503() {
        let (status, body, _) = post_json(
            app(),
            "/api/v1/sheets/generate",
            json!({ "topics": ["A1: Scope"], "lecture_content": "notes" }),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_of(&body)["error"]["code"], "GENERATION_DISABLED");
    }

    #[tokio::test]
    async fn test_generate_with_generator() {
        let generator: Arc<dyn SheetGenerator> = Arc::new(CannedGenerator(SHEET.to_string()));
        let app = build_router(test_state(Some(generator)));
        let (status, body, _) = post_json(
            app,
            "/api/v1/sheets/generate",
            json!({
                "topics": ["A1: Scope", "B1: Risk", "C1: Budget"],
                "lecture_content": "notes"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let body = json_of(&body);
        assert_eq!(body["ai_output"], SHEET);
        assert_eq!(body["page_count"], 1);
        assert_eq!(body["layout"].as_array().unwrap().len(), 2);
        assert_eq!(body["coverage"]["missing"], json!(["C1"]));
        assert_eq!(body["coverage"]["complete"], false);
    }

    #[tokio::test]
    async fn test_generate_with_unparseable_output_is_no_content() {
        let generator: Arc<dyn SheetGenerator> =
            Arc::new(CannedGenerator("Sorry, I cannot help.".to_string()));
        let app = build_router(test_state(Some(generator)));
        let (status, body, _) = post_json(
            app,
            "/api/v1/sheets/generate",
            json!({ "topics": ["A1: Scope"], "lecture_content": "notes" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_of(&body)["error"]["code"], "NO_CONTENT");
    }

    fn multipart_request(parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let boundary = "sheetboundary";
        let mut body = String::new();
        for (name, filename, value) in parts {
            body.push_str(&format!("--{boundary}\r\n"));
            match filename {
                Some(f) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                )),
            }
            body.push_str(value);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{boundary}--\r\n"));

        Request::builder()
            .method("POST")
            .uri("/api/v1/prompt")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_prompt_from_multipart() {
        let request = multipart_request(&[
            ("topics", None, "A1: Scope\n\nB1: Risk\n"),
            ("manual_content", None, "extra notes"),
            ("files", Some("week1.txt"), "Scope defines boundaries."),
            ("files", Some("broken.pdf"), "not really a pdf"),
        ]);
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = json_of(&body);
        let prompt = body["prompt"].as_str().unwrap();
        assert!(prompt.contains("\n\n---\n\n"));
        assert!(prompt.contains("- A1: Scope\n- B1: Risk"));
        assert!(prompt.contains("--- week1.txt ---\nScope defines boundaries."));
        assert!(prompt.contains("--- Manual Notes ---\nextra notes"));
        assert_eq!(body["warnings"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_prompt_requires_topics() {
        let request = multipart_request(&[("manual_content", None, "notes only")]);
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_prompt_requires_lecture_content() {
        let request = multipart_request(&[("topics", None, "A1: Scope")]);
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_format_topics_prompt() {
        let (status, body, _) = post_json(
            app(),
            "/api/v1/topics/format-prompt",
            json!({ "raw_topics": "Module 1\n- HTML" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(json_of(&body)["prompt"]
            .as_str()
            .unwrap()
            .contains("RAW TOPICS:\nModule 1\n- HTML"));
    }
}
