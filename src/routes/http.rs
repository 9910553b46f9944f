//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs basic request/result info.

use std::sync::Arc;
use axum::{extract::State, http::StatusCode, response::{IntoResponse, Response}, Json};
use tracing::{instrument, warn};

use crate::domain::Content;
use crate::error::PipelineError;
use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;

impl IntoResponse for PipelineError {
  fn into_response(self) -> Response {
    let status = match self {
      PipelineError::PreconditionViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, Json(ErrorOut { error: self.to_string() })).into_response()
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, remote_enabled: state.pipeline.remote_enabled() })
}

#[instrument(level = "info", skip(body), fields(text_len = body.text.len()))]
pub async fn http_post_analyze(Json(body): Json<AnalyzeIn>) -> impl IntoResponse {
  Json(do_analyze(&body.text))
}

#[instrument(level = "info", skip(state, content), fields(text_len = content.raw_text.len(), requested = content.options.question_count))]
pub async fn http_post_generate(
  State(state): State<Arc<AppState>>,
  Json(content): Json<Content>,
) -> Result<Json<GenerateOut>, PipelineError> {
  match do_generate(&state, content).await {
    Ok(out) => Ok(Json(out)),
    Err(e) => {
      warn!(target: "quizforge_backend", error = %e, "Generate request rejected");
      Err(e)
    }
  }
}
