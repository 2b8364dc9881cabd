//! HTTP surface: the note form plus the extraction/generation API
//!
//! All state is per-request; the service keeps nothing between calls beyond
//! the immutable configuration and the HTTP client.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::warn;

use crate::config::Config;
use crate::extractor::{extract_sections, ExtractedSections};
use crate::llm_client::{EndpointStatus, LlmClient};
use crate::note::{generate_note, GeneratedNote, NoteError};
use crate::prompt::NoteInput;

/// Request body cap; transcripts are pasted text, never uploads
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub client: LlmClient,
}

/// Error response carried to the client as JSON.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<NoteError> for ApiError {
    fn from(err: NoteError) -> Self {
        let status = match err {
            NoteError::MissingField { .. } | NoteError::MissingApiKey => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            NoteError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        ApiError {
            status,
            message: err.user_message(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExtractRequest {
    transcript: String,
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    api_key: String,
    input: NoteInput,
    /// Overrides the configured model when present
    model: Option<String>,
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/api/extract", post(extract))
        .route("/api/notes", post(generate))
        .route("/api/status", get(status))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    const FORM: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/index.html"));
    Html(FORM)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn extract(Json(request): Json<ExtractRequest>) -> Json<ExtractedSections> {
    Json(extract_sections(&request.transcript))
}

async fn generate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GeneratedNote>, ApiError> {
    let model = request.model.as_deref().unwrap_or(&state.config.model);

    let note = generate_note(
        &state.client,
        &request.api_key,
        model,
        state.config.api_style,
        &request.input,
    )
    .await
    .map_err(|e| {
        warn!("note generation failed: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(note))
}

async fn status(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Json<EndpointStatus> {
    let api_key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    Json(state.client.check_status(api_key).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiStyle;
    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tower::ServiceExt;

    #[derive(Clone)]
    struct MockLlm {
        status: StatusCode,
        body: serde_json::Value,
        hits: Arc<AtomicUsize>,
    }

    async fn completion_handler(
        State(mock): State<MockLlm>,
    ) -> (StatusCode, Json<serde_json::Value>) {
        mock.hits.fetch_add(1, Ordering::SeqCst);
        (mock.status, Json(mock.body.clone()))
    }

    async fn models_handler() -> Json<serde_json::Value> {
        Json(serde_json::json!({"data": [{"id": "gpt-3.5-turbo"}]}))
    }

    async fn spawn_mock_llm(
        status: StatusCode,
        body: serde_json::Value,
    ) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let mock = MockLlm {
            status,
            body,
            hits: hits.clone(),
        };
        let app = Router::new()
            .route("/v1/chat/completions", post(completion_handler))
            .route("/v1/completions", post(completion_handler))
            .route("/v1/models", get(models_handler))
            .with_state(mock);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), hits)
    }

    fn test_app(base_url: &str) -> Router {
        let config = Config {
            llm_base_url: base_url.to_string(),
            api_style: ApiStyle::Chat,
            ..Config::default()
        };
        let client = LlmClient::new(base_url, Duration::from_secs(5)).unwrap();
        router(Arc::new(AppState { config, client }))
    }

    fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_healthz() {
        let app = test_app("http://localhost:4000");
        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_index_serves_the_form() {
        let app = test_app("http://localhost:4000");
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let page = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(page.contains("Procedural Note"));
        assert!(page.contains("api/notes"));
    }

    #[tokio::test]
    async fn test_extract_route() {
        let app = test_app("http://localhost:4000");
        let request = json_request(
            "/api/extract",
            serde_json::json!({"transcript": "Subjective: foo\nObjective: bar"}),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["subjective"], "foo");
        assert_eq!(body["objective"], "bar");
    }

    #[tokio::test]
    async fn test_generate_missing_field_is_422_without_upstream_call() {
        let (url, hits) = spawn_mock_llm(
            StatusCode::OK,
            serde_json::json!({"choices": [{"message": {"role": "assistant", "content": "note"}}]}),
        )
        .await;
        let app = test_app(&url);

        let request = json_request(
            "/api/notes",
            serde_json::json!({
                "api_key": "sk-test",
                "input": {"kind": "soap", "subjective": "", "objective": "bar"}
            }),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("subjective"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generate_success() {
        let (url, hits) = spawn_mock_llm(
            StatusCode::OK,
            serde_json::json!({"choices": [{"message": {"role": "assistant", "content": " A fine note. "}}]}),
        )
        .await;
        let app = test_app(&url);

        let request = json_request(
            "/api/notes",
            serde_json::json!({
                "api_key": "sk-test",
                "input": {"kind": "soap", "subjective": "foo", "objective": "bar"}
            }),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["content"], "A fine note.");
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_generate_upstream_failure_is_502_with_error_prefix() {
        let (url, _hits) = spawn_mock_llm(
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({"error": {"message": "quota exceeded"}}),
        )
        .await;
        let app = test_app(&url);

        let request = json_request(
            "/api/notes",
            serde_json::json!({
                "api_key": "sk-test",
                "input": {"kind": "soap", "subjective": "foo", "objective": "bar"}
            }),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = json_body(response).await;
        let message = body["error"].as_str().unwrap();
        assert!(message.starts_with("Error: "), "got: {}", message);
    }

    #[tokio::test]
    async fn test_generate_model_override() {
        let (url, _hits) = spawn_mock_llm(
            StatusCode::OK,
            serde_json::json!({"choices": [{"message": {"role": "assistant", "content": "note"}}]}),
        )
        .await;
        let app = test_app(&url);

        let request = json_request(
            "/api/notes",
            serde_json::json!({
                "api_key": "sk-test",
                "model": "gpt-4",
                "input": {"kind": "procedure", "patient_info": "54yo", "procedure_details": "arthroscopy"}
            }),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["model"], "gpt-4");
    }

    #[tokio::test]
    async fn test_status_route_reports_models() {
        let (url, _hits) = spawn_mock_llm(StatusCode::OK, serde_json::json!({})).await;
        let app = test_app(&url);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["connected"], true);
        assert_eq!(body["available_models"][0], "gpt-3.5-turbo");
    }
}
