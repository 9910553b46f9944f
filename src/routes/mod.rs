//! Router assembly: HTTP endpoints, WebSocket upgrade, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - REST-ish API under `/api/v1/...`
/// - CORS (allow any origin/method/headers); tighten for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/analyze", post(http::http_post_analyze))
        .route("/api/v1/generate", post(http::http_post_generate))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{
        body::{to_bytes, Body},
        http::{header::CONTENT_TYPE, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::PipelineConfig;
    use crate::pipeline::Pipeline;

    fn app() -> Router {
        let state = AppState::with_pipeline(Pipeline::new(&PipelineConfig::default(), None));
        build_router(Arc::new(state))
    }

    async fn send(req: Request<Body>) -> (StatusCode, Value) {
        let res = app().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_remote_state() {
        let (status, body) = send(Request::get("/api/v1/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": true, "remoteEnabled": false }));
    }

    #[tokio::test]
    async fn analyze_returns_a_report() {
        let (status, body) = send(post_json(
            "/api/v1/analyze",
            json!({ "text": "# Arrays\nAn array stores values. Every array has a length." }),
        ))
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["classification"]["domain"], "programming");
        assert_eq!(body["structure"]["headings"][0]["text"], "Arrays");
        assert_eq!(body["detectedLanguage"], "en");
    }

    #[tokio::test]
    async fn generate_runs_the_pipeline_offline() {
        let (status, body) = send(post_json(
            "/api/v1/generate",
            json!({
                "rawText": "A function returns a value. Every function has a name, and a variable holds data.",
                "options": { "questionCount": 4, "difficulty": "easy" }
            }),
        ))
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metadata"]["generationType"], "heuristic_from_understanding");
        assert_eq!(body["metadata"]["understandingFallback"], "gateway_disabled");
        assert_eq!(body["understanding"]["provenance"], "heuristic");
        let questions = body["questions"].as_array().unwrap();
        assert!(!questions.is_empty() && questions.len() <= 4);
        assert!(questions.iter().all(|q| q["difficulty"] == "easy"));
        assert_eq!(body["notices"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn invalid_options_are_unprocessable() {
        let (status, body) = send(post_json(
            "/api/v1/generate",
            json!({ "rawText": "text", "options": { "questionCount": 0 } }),
        ))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("questionCount"));
    }
}
