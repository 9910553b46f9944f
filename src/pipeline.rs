//! Pipeline orchestration: validate, understand, synthesize, assemble.
//!
//! Each stage runs in its own tokio task. A stage that returns always yields a
//! value (remote or heuristic); a stage that panics is a hard fault and sends
//! the run down the direct-from-text path.

use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use crate::config::PipelineConfig;
use crate::direct::{minimal_understanding, DirectFallbackGenerator};
use crate::domain::{
  cognitive_distribution, Content, GenerationType, PipelineResult, Question, QuestionType, ResultMetadata,
  Understanding,
};
use crate::error::{FailureKind, PipelineError};
use crate::fallback::{CorrectFirst, OptionOrdering, Shuffled};
use crate::gateway::CompletionGateway;
use crate::questions::QuestionSynthesisStage;
use crate::stage::StageOutcome;
use crate::understanding::UnderstandingStage;

pub struct Pipeline {
  understanding: UnderstandingStage,
  questions: QuestionSynthesisStage,
  ordering: Arc<dyn OptionOrdering>,
  max_question_count: usize,
  remote_enabled: bool,
}

impl Pipeline {
  /// `gateway = None` runs every stage on its heuristic path.
  pub fn new(cfg: &PipelineConfig, gateway: Option<Arc<dyn CompletionGateway>>) -> Self {
    let prompts = Arc::new(cfg.prompts.clone());
    let ordering: Arc<dyn OptionOrdering> =
      if cfg.generation.shuffle_options { Arc::new(Shuffled) } else { Arc::new(CorrectFirst) };
    Self {
      remote_enabled: gateway.is_some(),
      understanding: UnderstandingStage::new(gateway.clone(), prompts.clone(), cfg.generation.understanding),
      questions: QuestionSynthesisStage::new(gateway, prompts, cfg.generation.questions, ordering.clone()),
      ordering,
      max_question_count: cfg.generation.max_question_count,
    }
  }

  pub fn remote_enabled(&self) -> bool {
    self.remote_enabled
  }

  #[instrument(
    level = "info",
    skip_all,
    fields(text_len = content.raw_text.len(), requested = content.options.question_count)
  )]
  pub async fn run(&self, content: Content) -> Result<PipelineResult, PipelineError> {
    content.options.validate(self.max_question_count)?;
    let content = Arc::new(content);

    let stage = self.understanding.clone();
    let input = content.clone();
    let understood = match tokio::spawn(async move { stage.run(&input).await }).await {
      Ok(outcome) => outcome,
      Err(e) => {
        error!(target: "pipeline", error = %e, "Understanding stage did not complete; using direct generation");
        let understanding = minimal_understanding(&content);
        return Ok(self.direct(&content, understanding, Some(FailureKind::HardFault), None));
      }
    };
    debug!(target: "pipeline", provenance = ?understood.provenance(), "Understanding ready");
    let understanding_fallback = understood.reason();
    let understanding = understood.into_value();

    let stage = self.questions.clone();
    let (u, opts) = (understanding.clone(), content.options.clone());
    let synthesized = match tokio::spawn(async move { stage.run(&u, &opts).await }).await {
      Ok(outcome) => outcome,
      Err(e) => {
        error!(target: "pipeline", error = %e, "Question stage did not complete; using direct generation");
        return Ok(self.direct(&content, understanding, understanding_fallback, Some(FailureKind::HardFault)));
      }
    };

    let generation_type = match synthesized {
      StageOutcome::Remote(_) => GenerationType::Remote,
      StageOutcome::Fallback { .. } => GenerationType::HeuristicFromUnderstanding,
    };
    let questions_fallback = synthesized.reason();
    let questions = conform(synthesized.into_value(), &content);

    Ok(assemble(understanding, questions, generation_type, understanding_fallback, questions_fallback))
  }

  fn direct(
    &self,
    content: &Content,
    understanding: Understanding,
    understanding_fallback: Option<FailureKind>,
    questions_fallback: Option<FailureKind>,
  ) -> PipelineResult {
    let questions = DirectFallbackGenerator::new(self.ordering.as_ref()).generate(content);
    let questions = conform(questions, content);
    assemble(understanding, questions, GenerationType::DirectHeuristic, understanding_fallback, questions_fallback)
  }
}

/// Render multiple-choice items open-ended when the caller did not ask for them.
fn conform(questions: Vec<Question>, content: &Content) -> Vec<Question> {
  if content.options.question_types.contains(&QuestionType::MultipleChoice) {
    questions
  } else {
    questions.into_iter().map(Question::into_open_ended).collect()
  }
}

fn assemble(
  understanding: Understanding,
  questions: Vec<Question>,
  generation_type: GenerationType,
  understanding_fallback: Option<FailureKind>,
  questions_fallback: Option<FailureKind>,
) -> PipelineResult {
  info!(
    target: "pipeline",
    ?generation_type,
    questions = questions.len(),
    understanding = ?understanding.provenance,
    "Pipeline finished"
  );
  PipelineResult {
    metadata: ResultMetadata {
      domain: understanding.domain,
      generation_type,
      cognitive_distribution: cognitive_distribution(&questions),
      understanding_fallback,
      questions_fallback,
    },
    understanding,
    questions,
  }
}
