//! Application state: the pipeline and its process-wide configuration.
//!
//! Built once at startup. The gateway (if any) and the prompt table are
//! read-only from here on and shared across requests through `Arc`.

use std::sync::Arc;
use tracing::{info, instrument};

use crate::config::load_pipeline_config_from_env;
use crate::gateway::CompletionGateway;
use crate::openai::OpenAI;
use crate::pipeline::Pipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    /// Build state from env: load config, init the OpenAI client if keyed.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_pipeline_config_from_env().unwrap_or_default();

        let gateway: Option<Arc<dyn CompletionGateway>> = match OpenAI::from_env(&cfg.gateway) {
            Some(oa) => {
                info!(
                    target: "quizforge_backend",
                    base_url = %oa.base_url,
                    analysis_model = %oa.models.analysis,
                    chat_model = %oa.models.chat,
                    coding_model = %oa.models.coding,
                    "OpenAI enabled."
                );
                Some(Arc::new(oa))
            }
            None => {
                info!(target: "quizforge_backend", "OpenAI disabled (no OPENAI_API_KEY). Using local heuristics.");
                None
            }
        };

        info!(
            target: "quizforge_backend",
            max_question_count = cfg.generation.max_question_count,
            shuffle_options = cfg.generation.shuffle_options,
            "Pipeline configured"
        );
        Self::with_pipeline(Pipeline::new(&cfg, gateway))
    }

    pub fn with_pipeline(pipeline: Pipeline) -> Self {
        Self { pipeline: Arc::new(pipeline) }
    }
}
