//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::logic::*;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "quizforge_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "quizforge_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply_msg = handle_text(&txt, &state).await;
        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "quizforge_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "quizforge_backend", "WebSocket disconnected");
}

/// Parse, dispatch, and build the reply for one text frame.
async fn handle_text(txt: &str, state: &AppState) -> ServerWsMessage {
  match serde_json::from_str::<ClientWsMessage>(txt) {
    Ok(incoming) => {
      debug!(target: "quizforge_backend", "WS received: {:?}", &incoming);
      handle_client_ws(incoming, state).await
    }
    Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
  }
}

#[instrument(level = "info", skip_all)]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::Analyze { text } => ServerWsMessage::Analysis { report: do_analyze(&text) },

    ClientWsMessage::Generate { content } => match do_generate(state, content).await {
      Ok(out) => {
        info!(target: "quizforge_backend", questions = out.result.questions.len(), "WS generate served");
        ServerWsMessage::Generated { result: out.result, notices: out.notices }
      }
      Err(e) => ServerWsMessage::Error { message: e.to_string() },
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::Value;

  use crate::config::PipelineConfig;
  use crate::pipeline::Pipeline;

  fn state() -> AppState {
    AppState::with_pipeline(Pipeline::new(&PipelineConfig::default(), None))
  }

  async fn reply(txt: &str) -> Value {
    serde_json::to_value(handle_text(txt, &state()).await).unwrap()
  }

  #[tokio::test]
  async fn ping_pong() {
    assert_eq!(reply(r#"{"type":"ping"}"#).await["type"], "pong");
  }

  #[tokio::test]
  async fn bad_json_is_an_error_reply() {
    let v = reply("not json").await;
    assert_eq!(v["type"], "error");
    assert!(v["message"].as_str().unwrap().starts_with("Invalid JSON"));
  }

  #[tokio::test]
  async fn analyze_over_ws() {
    let v = reply(r#"{"type":"analyze","text":"The empire fought a battle in the ancient century."}"#).await;
    assert_eq!(v["type"], "analysis");
    assert_eq!(v["report"]["classification"]["domain"], "history");
  }

  #[tokio::test]
  async fn generate_over_ws() {
    let v = reply(
      r#"{"type":"generate","content":{"rawText":"A variable stores a value. A function reads the variable.","options":{"questionCount":2}}}"#,
    )
    .await;
    assert_eq!(v["type"], "generated");
    assert!(v["result"]["questions"].as_array().unwrap().len() <= 2);
    assert_eq!(v["notices"].as_array().unwrap().len(), 2);

    let v = reply(r#"{"type":"generate","content":{"rawText":"x","options":{"questionCount":0}}}"#).await;
    assert_eq!(v["type"], "error");
  }
}
