//! Question synthesis: one remote attempt, validated item by item, else the
//! heuristic generator over the Understanding.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::config::{Prompts, Task};
use crate::domain::{
  CognitiveLevel, Complexity, Difficulty, Domain, GenerationOptions, Provenance, Question, QuestionType,
  Understanding,
};
use crate::error::StageError;
use crate::extract::extract_structured_payload;
use crate::fallback::{new_question_id, FallbackQuestionGenerator, OptionOrdering};
use crate::gateway::{CompletionGateway, CompletionOptions, ModelAlias};
use crate::stage::StageOutcome;
use crate::templates::domain_label;
use crate::util::{fill_template, trunc_for_log};

#[derive(Clone)]
pub struct QuestionSynthesisStage {
  gateway: Option<Arc<dyn CompletionGateway>>,
  prompts: Arc<Prompts>,
  options: CompletionOptions,
  ordering: Arc<dyn OptionOrdering>,
}

impl QuestionSynthesisStage {
  pub fn new(
    gateway: Option<Arc<dyn CompletionGateway>>,
    prompts: Arc<Prompts>,
    options: CompletionOptions,
    ordering: Arc<dyn OptionOrdering>,
  ) -> Self {
    Self { gateway, prompts, options, ordering }
  }

  #[instrument(level = "info", skip_all, fields(requested = opts.question_count, concepts = u.concepts.len()))]
  pub async fn run(&self, u: &Understanding, opts: &GenerationOptions) -> StageOutcome<Vec<Question>> {
    let attempt = match &self.gateway {
      Some(gw) => self.attempt(gw.as_ref(), u, opts).await,
      None => Err(StageError::GatewayDisabled),
    };
    match attempt {
      Ok(questions) => {
        info!(target: "pipeline", count = questions.len(), "Remote questions accepted");
        StageOutcome::Remote(questions)
      }
      Err(e) => {
        let reason = e.kind();
        warn!(target: "pipeline", error = %e, ?reason, "Using heuristic questions");
        let questions = FallbackQuestionGenerator::new(self.ordering.as_ref()).generate(u, opts);
        StageOutcome::Fallback { value: questions, reason }
      }
    }
  }

  async fn attempt(
    &self,
    gw: &dyn CompletionGateway,
    u: &Understanding,
    opts: &GenerationOptions,
  ) -> Result<Vec<Question>, StageError> {
    let prompt = build_prompt(&self.prompts, u, opts);
    let completion = gw.send_completion(&prompt, alias_for(u.domain), &self.options).await?;
    let parsed = extract_structured_payload(&completion.text)
      .map_err(StageError::from)
      .and_then(|payload| validate_questions(&payload, u, opts));
    if parsed.is_err() {
      debug!(target: "pipeline", raw = %trunc_for_log(&completion.text, 300), "Rejected questions reply");
    }
    parsed
  }
}

/// Programming content goes to the coding model.
pub fn alias_for(domain: Domain) -> ModelAlias {
  match domain {
    Domain::Programming => ModelAlias::Coding,
    _ => ModelAlias::Chat,
  }
}

fn complexity_label(c: Complexity) -> &'static str {
  match c {
    Complexity::Beginner => "beginner",
    Complexity::Intermediate => "intermediate",
    Complexity::Advanced => "advanced",
  }
}

fn build_prompt(prompts: &Prompts, u: &Understanding, opts: &GenerationOptions) -> String {
  let key_points: Vec<String> = u.key_points.iter().map(|k| format!("- {k}")).collect();
  let concepts: Vec<String> = u.concepts.iter().map(|c| format!("- {}: {}", c.name, c.definition)).collect();
  let points: Vec<String> = u
    .testable_points
    .iter()
    .map(|p| {
      let label = format!("{:?}/{:?}", p.kind, p.difficulty).to_lowercase();
      format!("- [{label}] {}", p.point)
    })
    .collect();
  let types: Vec<&str> = opts.question_types.iter().map(|t| t.as_str()).collect();
  let count = opts.question_count.to_string();

  fill_template(
    prompts.template(Task::Questions, opts.language),
    &[
      ("summary", &u.summary),
      ("main_topic", &u.main_topic),
      ("key_points", &key_points.join("\n")),
      ("concepts", &concepts.join("\n")),
      ("testable_points", &points.join("\n")),
      ("complexity", complexity_label(u.complexity)),
      ("question_count", &count),
      ("difficulty", opts.difficulty.as_str()),
      ("question_types", &types.join(", ")),
    ],
  )
}

fn field<'a>(item: &'a Map<String, Value>, camel: &str, snake: &str) -> Option<&'a Value> {
  item.get(camel).or_else(|| item.get(snake))
}

/// Accept the list only if every item is usable.
fn validate_questions(
  payload: &Map<String, Value>,
  u: &Understanding,
  opts: &GenerationOptions,
) -> Result<Vec<Question>, StageError> {
  let items = payload
    .get("questions")
    .and_then(Value::as_array)
    .ok_or_else(|| StageError::ValidationFailed("questions list missing".into()))?;
  if items.is_empty() {
    return Err(StageError::ValidationFailed("questions list is empty".into()));
  }

  let category = domain_label(u.domain, opts.language);
  let mut out = Vec::with_capacity(items.len().min(opts.question_count));
  for (i, item) in items.iter().take(opts.question_count).enumerate() {
    let item = item
      .as_object()
      .ok_or_else(|| StageError::ValidationFailed(format!("question {i} is not an object")))?;
    out.push(validate_item(i, item, u, opts, category)?);
  }
  Ok(out)
}

fn validate_item(
  i: usize,
  item: &Map<String, Value>,
  u: &Understanding,
  opts: &GenerationOptions,
  category: &str,
) -> Result<Question, StageError> {
  let fail = |why: &str| StageError::ValidationFailed(format!("question {i}: {why}"));

  let text = item
    .get("text")
    .and_then(Value::as_str)
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or_else(|| fail("text missing"))?;

  let options: Vec<String> = item
    .get("options")
    .and_then(Value::as_array)
    .ok_or_else(|| fail("options missing"))?
    .iter()
    .map(|o| o.as_str().map(|s| s.trim().to_string()))
    .collect::<Option<Vec<String>>>()
    .ok_or_else(|| fail("options must be strings"))?;

  let answer = field(item, "correctAnswer", "correct_answer").ok_or_else(|| fail("correctAnswer missing"))?;

  let (kind, correct_answer) = match options.len() {
    0 => (QuestionType::OpenEnded, None),
    4 => {
      let idx = answer.as_u64().filter(|n| *n <= 3).ok_or_else(|| fail("correctAnswer must be 0..=3"))?;
      (QuestionType::MultipleChoice, Some(idx as usize))
    }
    n => return Err(fail(&format!("expected 0 or 4 options, got {n}"))),
  };

  let difficulty = item
    .get("difficulty")
    .and_then(Value::as_str)
    .and_then(Difficulty::parse)
    .or(opts.difficulty.fixed())
    .unwrap_or_else(|| u.complexity.implied_difficulty());
  let cognitive_level = field(item, "cognitiveLevel", "cognitive_level")
    .and_then(Value::as_str)
    .and_then(CognitiveLevel::parse)
    .unwrap_or(CognitiveLevel::Comprehension);
  let related_concept = field(item, "relatedConcept", "related_concept")
    .and_then(Value::as_str)
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string);

  Ok(Question {
    id: new_question_id(),
    text: text.to_string(),
    kind,
    options,
    correct_answer,
    explanation: item.get("explanation").and_then(Value::as_str).unwrap_or_default().trim().to_string(),
    difficulty,
    category: category.to_string(),
    cognitive_level,
    related_concept,
    provenance: Provenance::Remote,
  })
}
