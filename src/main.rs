//! QuizForge · Question Generation Backend
//!
//! - Axum HTTP + WebSocket API
//! - Two-stage pipeline (understanding, then questions) with optional OpenAI
//!   integration and deterministic local fallbacks
//!
//! Important env variables:
//!   PORT                 : u16 (default 3000)
//!   OPENAI_API_KEY       : enables remote generation if present
//!   OPENAI_BASE_URL      : overrides the configured base URL
//!   PIPELINE_CONFIG_PATH : path to TOML config (gateway, generation, prompts)
//!   LOG_LEVEL            : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT           : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod vocab;
mod analyzer;
mod templates;
mod extract;
mod gateway;
mod config;
mod openai;
mod stage;
mod understanding;
mod fallback;
mod questions;
mod direct;
mod pipeline;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (config, optional OpenAI client, pipeline).
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "quizforge_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "quizforge_backend", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  match tokio::signal::ctrl_c().await {
    Ok(()) => info!(target: "quizforge_backend", "Shutdown signal received"),
    Err(e) => error!(target: "quizforge_backend", error = %e, "Failed to listen for shutdown signal"),
  }
}
