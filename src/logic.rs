//! Core behaviors shared by both HTTP and WebSocket handlers.

use tracing::{info, instrument};

use crate::analyzer::{analyze, TextReport};
use crate::domain::Content;
use crate::error::PipelineError;
use crate::protocol::{notices_for, GenerateOut};
use crate::state::AppState;

#[instrument(level = "info", skip(text), fields(text_len = text.len()))]
pub fn do_analyze(text: &str) -> TextReport {
  let report = analyze(text);
  info!(
    target: "quizforge_backend",
    domain = report.classification.domain.as_str(),
    concepts = report.concepts.len(),
    "Text analyzed"
  );
  report
}

#[instrument(level = "info", skip(state, content), fields(text_len = content.raw_text.len()))]
pub async fn do_generate(state: &AppState, content: Content) -> Result<GenerateOut, PipelineError> {
  let lang = content.options.language;
  let result = state.pipeline.run(content).await?;
  let notices = notices_for(&result, lang);
  info!(
    target: "quizforge_backend",
    questions = result.questions.len(),
    generation_type = ?result.metadata.generation_type,
    notices = notices.len(),
    "Questions generated"
  );
  Ok(GenerateOut { result, notices })
}
