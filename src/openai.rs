//! OpenAI-compatible completion gateway.
//!
//! We only call chat.completions with a single user message and return the raw
//! text. Calls are instrumented and log model names, latencies, and usage (not
//! contents). Exactly one request per call; failures are classified, never retried.
//!
//! NOTE: We never log the API key.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::{GatewayConfig, ModelTable};
use crate::error::{GatewayError, GatewayErrorKind};
use crate::gateway::{Completion, CompletionGateway, CompletionOptions, ModelAlias, Usage};

#[derive(Clone)]
pub struct OpenAI {
  client: reqwest::Client,
  api_key: String,
  pub base_url: String,
  pub models: ModelTable,
}

impl OpenAI {
  /// Build a client against an explicit configuration value.
  pub fn new(cfg: &GatewayConfig, api_key: impl Into<String>) -> Result<Self, reqwest::Error> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(cfg.timeout_secs))
      .build()?;
    Ok(Self {
      client,
      api_key: api_key.into(),
      base_url: cfg.base_url.trim_end_matches('/').to_string(),
      models: cfg.models.clone(),
    })
  }

  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  /// OPENAI_BASE_URL overrides the configured base URL.
  pub fn from_env(cfg: &GatewayConfig) -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let mut cfg = cfg.clone();
    if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
      cfg.base_url = url;
    }
    match Self::new(&cfg, api_key) {
      Ok(c) => Some(c),
      Err(e) => {
        error!(target: "quizforge_backend", error = %e, "Failed to build HTTP client; remote generation disabled");
        None
      }
    }
  }
}

#[async_trait]
impl CompletionGateway for OpenAI {
  #[instrument(
    level = "info",
    skip(self, prompt, options),
    fields(alias = alias.as_str(), model = %self.models.resolve(alias), prompt_len = prompt.len())
  )]
  async fn send_completion(
    &self,
    prompt: &str,
    alias: ModelAlias,
    options: &CompletionOptions,
  ) -> Result<Completion, GatewayError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.models.resolve(alias).to_string(),
      messages: vec![ChatMessageReq { role: "user".into(), content: prompt.into() }],
      temperature: options.temperature,
      top_p: options.top_p,
      frequency_penalty: options.frequency_penalty,
      presence_penalty: options.presence_penalty,
      max_tokens: Some(options.max_tokens),
    };

    let start = Instant::now();
    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "quizforge-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req)
      .send()
      .await
      .map_err(|e| {
        let kind = classify_transport(&e);
        error!(elapsed = ?start.elapsed(), %kind, error = %e, "Completion request failed");
        GatewayError::new(kind, e.to_string())
      })?;

    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or(body);
      let kind = classify_status(status);
      error!(elapsed = ?start.elapsed(), %status, %kind, "Completion request rejected");
      return Err(GatewayError::new(kind, format!("HTTP {}: {}", status, msg)));
    }

    let body: ChatCompletionResponse = res
      .json()
      .await
      .map_err(|e| GatewayError::new(GatewayErrorKind::RemoteUnknownError, format!("response decode error: {}", e)))?;

    let usage = body.usage.map(Usage::from).unwrap_or_default();
    info!(
      elapsed = ?start.elapsed(),
      prompt_tokens = usage.prompt_tokens,
      completion_tokens = usage.completion_tokens,
      total_tokens = usage.total_tokens,
      "Completion usage"
    );

    let text = body
      .choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content)
      .unwrap_or_default()
      .trim()
      .to_string();

    Ok(Completion { text, usage })
  }
}

/// DNS failures and refused connections surface as connect errors.
fn classify_transport(e: &reqwest::Error) -> GatewayErrorKind {
  if e.is_connect() {
    GatewayErrorKind::RemoteUnavailable
  } else {
    GatewayErrorKind::RemoteUnknownError
  }
}

pub fn classify_status(status: StatusCode) -> GatewayErrorKind {
  match status.as_u16() {
    401 => GatewayErrorKind::RemoteUnauthorized,
    429 => GatewayErrorKind::RemoteRateLimited,
    500..=599 => GatewayErrorKind::RemoteServerError,
    _ => GatewayErrorKind::RemoteUnknownError,
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  top_p: f32,
  frequency_penalty: f32,
  presence_penalty: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<UsageResp>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct UsageResp {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

impl From<UsageResp> for Usage {
  fn from(u: UsageResp) -> Self {
    Usage {
      prompt_tokens: u.prompt_tokens.unwrap_or(0),
      completion_tokens: u.completion_tokens.unwrap_or(0),
      total_tokens: u.total_tokens.unwrap_or(0),
    }
  }
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{http::StatusCode as AxumStatus, routing::post, Json, Router};
  use serde_json::json;
  use tokio::net::TcpListener;

  /// Serve `router` on an ephemeral port and return a gateway pointed at it.
  async fn gateway_for(router: Router) -> OpenAI {
    gateway_with_timeout(router, 5).await
  }

  async fn gateway_with_timeout(router: Router, timeout_secs: u64) -> OpenAI {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, router).await.unwrap();
    });
    let cfg = GatewayConfig { base_url: format!("http://{}", addr), timeout_secs, ..Default::default() };
    OpenAI::new(&cfg, "test-key").unwrap()
  }

  fn status_router(status: u16) -> Router {
    Router::new().route(
      "/chat/completions",
      post(move || async move {
        (
          AxumStatus::from_u16(status).unwrap(),
          Json(json!({ "error": { "message": "upstream says no" } })),
        )
      }),
    )
  }

  #[test]
  fn status_classification() {
    assert_eq!(classify_status(StatusCode::UNAUTHORIZED), GatewayErrorKind::RemoteUnauthorized);
    assert_eq!(classify_status(StatusCode::TOO_MANY_REQUESTS), GatewayErrorKind::RemoteRateLimited);
    assert_eq!(classify_status(StatusCode::BAD_GATEWAY), GatewayErrorKind::RemoteServerError);
    assert_eq!(classify_status(StatusCode::BAD_REQUEST), GatewayErrorKind::RemoteUnknownError);
    assert_eq!(classify_status(StatusCode::FORBIDDEN), GatewayErrorKind::RemoteUnknownError);
  }

  #[test]
  fn openai_error_body_is_unwrapped() {
    assert_eq!(extract_openai_error(r#"{"error":{"message":"quota"}}"#), Some("quota".into()));
    assert_eq!(extract_openai_error("plain text"), None);
  }

  #[tokio::test]
  async fn http_failures_are_classified() {
    for (status, kind) in [
      (401, GatewayErrorKind::RemoteUnauthorized),
      (429, GatewayErrorKind::RemoteRateLimited),
      (503, GatewayErrorKind::RemoteServerError),
      (418, GatewayErrorKind::RemoteUnknownError),
    ] {
      let gw = gateway_for(status_router(status)).await;
      let err = gw
        .send_completion("hi", ModelAlias::Chat, &CompletionOptions::default())
        .await
        .unwrap_err();
      assert_eq!(err.kind, kind, "status {status}");
      assert!(err.message.contains("upstream says no"));
    }
  }

  #[tokio::test]
  async fn refused_connection_is_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let cfg = GatewayConfig { base_url: format!("http://{}", addr), timeout_secs: 5, ..Default::default() };
    let gw = OpenAI::new(&cfg, "k").unwrap();
    let err = gw
      .send_completion("hi", ModelAlias::Text, &CompletionOptions::default())
      .await
      .unwrap_err();
    assert_eq!(err.kind, GatewayErrorKind::RemoteUnavailable);
  }

  #[tokio::test]
  async fn timeout_is_an_unknown_error_not_unavailable() {
    let router = Router::new().route("/chat/completions", post(|| std::future::pending::<&'static str>()));
    let gw = gateway_with_timeout(router, 1).await;
    let err = gw
      .send_completion("hi", ModelAlias::Chat, &CompletionOptions::default())
      .await
      .unwrap_err();
    assert_eq!(err.kind, GatewayErrorKind::RemoteUnknownError);
  }

  #[tokio::test]
  async fn success_returns_text_usage_and_resolved_model() {
    let router = Router::new().route(
      "/chat/completions",
      post(|Json(body): Json<serde_json::Value>| async move {
        Json(json!({
          "choices": [{ "message": { "content": format!("  model={}  ", body["model"].as_str().unwrap_or("")) } }],
          "usage": { "prompt_tokens": 3, "completion_tokens": 4, "total_tokens": 7 }
        }))
      }),
    );
    let gw = gateway_for(router).await;
    let out = gw
      .send_completion("hi", ModelAlias::Analysis, &CompletionOptions::default())
      .await
      .unwrap();
    assert_eq!(out.text, "model=gpt-4o");
    assert_eq!(out.usage.total_tokens, 7);
  }
}
