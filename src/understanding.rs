//! Understanding stage: one remote attempt, then a deterministic local build.
//!
//! Flow (explicit states, see `State`):
//!   Init -> RemoteAttempted -> RemoteSucceeded -> Done
//!                           -> RemoteFailed -> FallbackBuilt -> Done
//! The stage never fails from the caller's point of view.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::analyzer::{
  assess_complexity, classify_domain, detect_language, extract_concepts, extract_structure, prose, split_sentences,
  CONCEPT_CAP,
};
use crate::config::{Prompts, Task};
use crate::domain::{
  Complexity, Concept, Content, Difficulty, Domain, Importance, Language, PointType, Provenance, TestablePoint,
  Understanding, MAX_CONCEPTS, MAX_KEY_POINTS, MAX_TESTABLE_POINTS,
};
use crate::error::{FailureKind, StageError};
use crate::extract::extract_structured_payload;
use crate::gateway::{Completion, CompletionGateway, CompletionOptions, ModelAlias};
use crate::stage::StageOutcome;
use crate::templates::{
  domain_point, CONCEPT_DEFINITION, COMPARE_POINT, COMPARE_WHY, LIST_SEPARATOR, SUMMARY_WITHOUT_CONCEPTS,
  SUMMARY_WITH_CONCEPTS, TOPIC_PLACEHOLDER, UNDERSTAND_POINT, UNDERSTAND_WHY,
};
use crate::util::{count_occurrences, fill_template, trunc_for_log, truncate_chars};

/// Sentences longer than this many characters count as substantial.
const MIN_SENTENCE_CHARS: usize = 20;
const IMPORTANT_SENTENCES: usize = 5;
const TOPIC_CHARS: usize = 50;
/// Concepts appearing this early in the text are rated high importance.
const LEADING_CHARS: usize = 200;

enum State {
  Init,
  RemoteAttempted(Result<Completion, StageError>),
  RemoteSucceeded(Understanding),
  RemoteFailed(FailureKind),
  FallbackBuilt(Understanding, FailureKind),
  Done(StageOutcome<Understanding>),
}

impl State {
  fn name(&self) -> &'static str {
    match self {
      State::Init => "init",
      State::RemoteAttempted(_) => "remote_attempted",
      State::RemoteSucceeded(_) => "remote_succeeded",
      State::RemoteFailed(_) => "remote_failed",
      State::FallbackBuilt(..) => "fallback_built",
      State::Done(_) => "done",
    }
  }
}

#[derive(Clone)]
pub struct UnderstandingStage {
  gateway: Option<Arc<dyn CompletionGateway>>,
  prompts: Arc<Prompts>,
  options: CompletionOptions,
}

impl UnderstandingStage {
  pub fn new(gateway: Option<Arc<dyn CompletionGateway>>, prompts: Arc<Prompts>, options: CompletionOptions) -> Self {
    Self { gateway, prompts, options }
  }

  #[instrument(level = "info", skip_all, fields(text_len = content.raw_text.len(), lang = ?content.options.language))]
  pub async fn run(&self, content: &Content) -> StageOutcome<Understanding> {
    let mut state = State::Init;
    loop {
      debug!(target: "pipeline", state = state.name(), "understanding stage");
      state = match state {
        State::Init => match &self.gateway {
          Some(gw) => State::RemoteAttempted(self.attempt(gw.as_ref(), content).await),
          None => State::RemoteFailed(FailureKind::GatewayDisabled),
        },
        State::RemoteAttempted(Ok(completion)) => match accept_remote(&completion.text, content) {
          Ok(u) => State::RemoteSucceeded(u),
          Err(e) => {
            debug!(target: "pipeline", raw = %trunc_for_log(&completion.text, 300), "Rejected understanding reply");
            warn!(target: "pipeline", error = %e, "Understanding payload rejected");
            State::RemoteFailed(e.kind())
          }
        },
        State::RemoteAttempted(Err(e)) => {
          warn!(target: "pipeline", error = %e, "Understanding request failed");
          State::RemoteFailed(e.kind())
        }
        State::RemoteSucceeded(u) => {
          info!(target: "pipeline", concepts = u.concepts.len(), domain = u.domain.as_str(), "Remote understanding accepted");
          State::Done(StageOutcome::Remote(u))
        }
        State::RemoteFailed(reason) => State::FallbackBuilt(build_fallback_understanding(content), reason),
        State::FallbackBuilt(u, reason) => {
          warn!(target: "pipeline", ?reason, concepts = u.concepts.len(), "Using heuristic understanding");
          State::Done(StageOutcome::Fallback { value: u, reason })
        }
        State::Done(outcome) => return outcome,
      };
    }
  }

  async fn attempt(&self, gw: &dyn CompletionGateway, content: &Content) -> Result<Completion, StageError> {
    let prompt = build_prompt(&self.prompts, content);
    Ok(gw.send_completion(&prompt, ModelAlias::Analysis, &self.options).await?)
  }
}

fn build_prompt(prompts: &Prompts, content: &Content) -> String {
  let tpl = prompts.template(Task::Understanding, content.options.language);
  fill_template(tpl, &[("content", &content.raw_text)])
}

// --- Remote payload ---

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RemoteUnderstanding {
  summary: String,
  #[serde(alias = "main_topic")]
  main_topic: String,
  #[serde(alias = "key_points")]
  key_points: Vec<String>,
  concepts: Vec<RemoteConcept>,
  #[serde(alias = "testable_points")]
  testable_points: Vec<RemotePoint>,
  complexity: Option<String>,
  domain: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RemoteConcept {
  name: String,
  definition: String,
  importance: Option<String>,
  #[serde(alias = "related_to")]
  related_to: Vec<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RemotePoint {
  point: String,
  #[serde(rename = "type")]
  kind: Option<String>,
  difficulty: Option<String>,
  why: String,
}

fn accept_remote(raw: &str, content: &Content) -> Result<Understanding, StageError> {
  let payload = extract_structured_payload(raw)?;
  validate_understanding(payload, content)
}

/// Minimal shape check plus normalization into the bounded model.
fn validate_understanding(payload: Map<String, Value>, content: &Content) -> Result<Understanding, StageError> {
  let remote: RemoteUnderstanding =
    serde_json::from_value(Value::Object(payload)).map_err(|e| StageError::ValidationFailed(e.to_string()))?;

  let concepts: Vec<Concept> = remote
    .concepts
    .into_iter()
    .filter(|c| !c.name.trim().is_empty())
    .map(|c| Concept {
      name: c.name.trim().to_string(),
      definition: c.definition.trim().to_string(),
      importance: c.importance.as_deref().map(Importance::parse).unwrap_or(Importance::Medium),
      related_to: c.related_to,
    })
    .collect();

  let testable_points: Vec<TestablePoint> = remote
    .testable_points
    .into_iter()
    .filter(|p| !p.point.trim().is_empty())
    .map(|p| TestablePoint {
      point: p.point.trim().to_string(),
      kind: p.kind.as_deref().map(PointType::parse).unwrap_or(PointType::Understanding),
      difficulty: p.difficulty.as_deref().and_then(Difficulty::parse).unwrap_or(Difficulty::Medium),
      why: p.why.trim().to_string(),
    })
    .collect();

  let summary = remote.summary.trim().to_string();
  if summary.is_empty() {
    return Err(StageError::ValidationFailed("summary is missing".into()));
  }
  if concepts.is_empty() && testable_points.is_empty() {
    return Err(StageError::ValidationFailed("neither concepts nor testablePoints present".into()));
  }

  let text = &content.raw_text;
  let main_topic = match remote.main_topic.trim() {
    "" => truncate_chars(&summary, TOPIC_CHARS),
    t => t.to_string(),
  };
  let domain = remote
    .domain
    .as_deref()
    .and_then(Domain::parse)
    .unwrap_or_else(|| classify_domain(text).domain);
  let complexity = remote
    .complexity
    .as_deref()
    .and_then(Complexity::parse)
    .unwrap_or_else(|| assess_complexity(text));

  Ok(
    Understanding {
      summary,
      main_topic,
      key_points: remote.key_points.into_iter().filter(|k| !k.trim().is_empty()).collect(),
      concepts,
      testable_points,
      detected_language: detect_language(text),
      complexity,
      domain,
      provenance: Provenance::Remote,
    }
    .bounded(),
  )
}

// --- Heuristic build ---

/// Build an Understanding from local analysis alone. Total function.
pub fn build_fallback_understanding(content: &Content) -> Understanding {
  let text = content.raw_text.as_str();
  let lang = content.options.language;
  let lower = text.to_lowercase();

  let all_sentences = split_sentences(&prose(text));
  let substantial: Vec<&String> =
    all_sentences.iter().filter(|s| s.chars().count() > MIN_SENTENCE_CHARS).collect();
  let important: Vec<&String> = substantial.iter().take(IMPORTANT_SENTENCES).copied().collect();

  let domain = classify_domain(text).domain;
  let mut names = extract_concepts(text, domain, CONCEPT_CAP);
  names.truncate(MAX_CONCEPTS);
  let structure = extract_structure(text);

  let main_topic = structure
    .headings
    .first()
    .map(|h| h.text.clone())
    .or_else(|| important.first().map(|s| truncate_chars(s, TOPIC_CHARS)))
    .unwrap_or_else(|| TOPIC_PLACEHOLDER.get(lang).to_string());

  let leading: String = lower.chars().take(LEADING_CHARS).collect();
  let concepts: Vec<Concept> = names
    .iter()
    .map(|name| Concept {
      name: name.clone(),
      definition: concept_definition(name, &substantial, &main_topic, lang),
      importance: rate_importance(count_occurrences(&lower, name), leading.contains(name.as_str())),
      related_to: related_concepts(name, &names, &all_sentences),
    })
    .collect();

  let summary = build_summary(&names, important.first().map(|s| s.as_str()), &main_topic, lang);

  let key_points: Vec<String> = if !structure.lists.is_empty() {
    structure.lists.iter().take(MAX_KEY_POINTS).cloned().collect()
  } else {
    important.iter().take(MAX_KEY_POINTS).map(|s| s.to_string()).collect()
  };

  let mut testable_points = build_testable_points(&names, domain, &main_topic, lang);
  testable_points.truncate(MAX_TESTABLE_POINTS);

  let meta = content.file_metadata.as_ref();
  let detected_language = meta.and_then(|m| m.detected_language).unwrap_or_else(|| detect_language(text));
  let complexity = meta.and_then(|m| m.complexity).unwrap_or_else(|| assess_complexity(text));

  Understanding {
    summary,
    main_topic,
    key_points,
    concepts,
    testable_points,
    detected_language,
    complexity,
    domain,
    provenance: Provenance::Heuristic,
  }
  .bounded()
}

fn rate_importance(frequency: usize, in_leading_text: bool) -> Importance {
  if frequency > 3 || in_leading_text {
    Importance::High
  } else if frequency > 1 {
    Importance::Medium
  } else {
    Importance::Low
  }
}

fn concept_definition(name: &str, sentences: &[&String], topic: &str, lang: Language) -> String {
  sentences
    .iter()
    .find(|s| s.to_lowercase().contains(name))
    .map(|s| truncate_chars(s, 200))
    .unwrap_or_else(|| fill_template(CONCEPT_DEFINITION.get(lang), &[("concept", name), ("topic", topic)]))
}

/// Other concepts sharing at least one sentence with `name`.
fn related_concepts(name: &str, names: &[String], sentences: &[String]) -> Vec<String> {
  let lowered: Vec<String> = sentences.iter().map(|s| s.to_lowercase()).collect();
  names
    .iter()
    .filter(|other| other.as_str() != name)
    .filter(|other| lowered.iter().any(|s| s.contains(name) && s.contains(other.as_str())))
    .take(3)
    .cloned()
    .collect()
}

fn build_summary(names: &[String], first_sentence: Option<&str>, topic: &str, lang: Language) -> String {
  let fragment = first_sentence.map(|s| truncate_chars(s, 100)).unwrap_or_default();
  let out = if names.is_empty() {
    fill_template(SUMMARY_WITHOUT_CONCEPTS.get(lang), &[("topic", topic), ("fragment", &fragment)])
  } else {
    let top: Vec<&str> = names.iter().take(3).map(String::as_str).collect();
    let joined = top.join(LIST_SEPARATOR.get(lang));
    fill_template(SUMMARY_WITH_CONCEPTS.get(lang), &[("concepts", &joined), ("fragment", &fragment)])
  };
  out.trim().to_string()
}

fn build_testable_points(names: &[String], domain: Domain, topic: &str, lang: Language) -> Vec<TestablePoint> {
  let mut points: Vec<TestablePoint> = names
    .iter()
    .take(3)
    .map(|name| TestablePoint {
      point: fill_template(UNDERSTAND_POINT.get(lang), &[("concept", name)]),
      kind: PointType::Understanding,
      difficulty: Difficulty::Easy,
      why: fill_template(UNDERSTAND_WHY.get(lang), &[("concept", name)]),
    })
    .collect();

  let subject = names.first().map(String::as_str).unwrap_or(topic);
  let dp = domain_point(domain);
  points.push(TestablePoint {
    point: fill_template(dp.point.get(lang), &[("concept", subject)]),
    kind: dp.kind,
    difficulty: dp.difficulty,
    why: dp.why.get(lang).to_string(),
  });

  if names.len() >= 2 {
    points.push(TestablePoint {
      point: fill_template(COMPARE_POINT.get(lang), &[("a", &names[0]), ("b", &names[1])]),
      kind: PointType::Analysis,
      difficulty: Difficulty::Hard,
      why: COMPARE_WHY.get(lang).to_string(),
    });
  }
  points
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{DetectedLanguage, FileMetadata, GenerationOptions};
  use crate::error::GatewayErrorKind;
  use crate::gateway::stub::ScriptedGateway;

  const PASSAGE: &str = "# Loops in Python\n\
    A loop repeats a block of code while a condition holds. \
    Every loop needs a variable that changes, otherwise the loop never ends. \
    A function can contain a loop, and a function can return early from it. \
    Python offers for and while loops for iterating over an array of values.";

  fn content(text: &str) -> Content {
    Content::new(text, GenerationOptions::default())
  }

  fn stage(gw: ScriptedGateway) -> UnderstandingStage {
    let gw: Arc<dyn CompletionGateway> = Arc::new(gw);
    UnderstandingStage::new(Some(gw), Arc::new(Prompts::default()), CompletionOptions::default())
  }

  #[tokio::test]
  async fn unparsable_reply_falls_back_to_heuristics() {
    let gw = ScriptedGateway::always(Ok("I cannot help with that.".into()));
    let outcome = stage(gw).run(&content(PASSAGE)).await;
    assert_eq!(outcome.reason(), Some(FailureKind::NoPayloadFound));
    let u = outcome.into_value();
    assert_eq!(u.provenance, Provenance::Heuristic);
    assert!(!u.concepts.is_empty());
    assert_eq!(u.domain, Domain::Programming);
    assert_eq!(u.main_topic, "Loops in Python");
  }

  #[tokio::test]
  async fn repeated_long_word_is_enough_for_a_concept() {
    let text = "Gardens need patience. Tomatoes grow slowly in gardens during spring.";
    let gw = ScriptedGateway::always(Ok("{not json".into()));
    let outcome = stage(gw).run(&content(text)).await;
    assert_eq!(outcome.reason(), Some(FailureKind::MalformedPayload));
    let u = outcome.into_value();
    assert_eq!(u.domain, Domain::General);
    assert_eq!(u.concepts[0].name, "gardens");
  }

  #[tokio::test]
  async fn gateway_failure_is_recorded() {
    let gw = ScriptedGateway::always(Err(GatewayErrorKind::RemoteRateLimited));
    let outcome = stage(gw).run(&content(PASSAGE)).await;
    assert_eq!(outcome.reason(), Some(FailureKind::Remote(GatewayErrorKind::RemoteRateLimited)));
    assert_eq!(outcome.provenance(), Provenance::Heuristic);
  }

  #[tokio::test]
  async fn no_gateway_means_disabled_fallback() {
    let stage = UnderstandingStage::new(None, Arc::new(Prompts::default()), CompletionOptions::default());
    let outcome = stage.run(&content(PASSAGE)).await;
    assert_eq!(outcome.reason(), Some(FailureKind::GatewayDisabled));
  }

  #[tokio::test]
  async fn valid_remote_payload_is_accepted_and_bounded() {
    let concepts: Vec<String> = (0..12)
      .map(|i| format!(r#"{{"name": "c{i}", "definition": "d{i}", "importance": "HIGH"}}"#))
      .collect();
    let reply = format!(
      r#"Sure! {{"summary": "About loops.", "main_topic": "Loops", "keyPoints": ["a","b","c","d","e","f","g"],
          "concepts": [{}], "testablePoints": [{{"point": "trace a loop", "type": "application", "difficulty": "hard", "why": "w"}}],
          "complexity": "advanced", "domain": "Programming"}}"#,
      concepts.join(",")
    );
    let gw = ScriptedGateway::always(Ok(reply));
    let outcome = stage(gw).run(&content(PASSAGE)).await;
    assert!(matches!(outcome, StageOutcome::Remote(_)));
    let u = outcome.into_value();
    assert_eq!(u.provenance, Provenance::Remote);
    assert_eq!(u.main_topic, "Loops");
    assert_eq!(u.key_points.len(), MAX_KEY_POINTS);
    assert_eq!(u.concepts.len(), MAX_CONCEPTS);
    assert_eq!(u.concepts[0].importance, Importance::High);
    assert_eq!(u.testable_points[0].kind, PointType::Application);
    assert_eq!(u.complexity, Complexity::Advanced);
    assert_eq!(u.domain, Domain::Programming);
    assert_eq!(u.detected_language, DetectedLanguage::En);
  }

  #[tokio::test]
  async fn payload_without_concepts_or_points_fails_validation() {
    let gw = ScriptedGateway::always(Ok(r#"{"summary": "x", "concepts": [], "testablePoints": []}"#.into()));
    let outcome = stage(gw).run(&content(PASSAGE)).await;
    assert_eq!(outcome.reason(), Some(FailureKind::ValidationFailed));
  }

  #[tokio::test]
  async fn prompt_embeds_the_full_text() {
    let gw = Arc::new(ScriptedGateway::always(Err(GatewayErrorKind::RemoteServerError)));
    let dyn_gw: Arc<dyn CompletionGateway> = gw.clone();
    let stage = UnderstandingStage::new(Some(dyn_gw), Arc::new(Prompts::default()), CompletionOptions::default());
    stage.run(&content(PASSAGE)).await;
    let prompts = gw.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].0, ModelAlias::Analysis);
    assert!(prompts[0].1.contains(PASSAGE));
  }

  #[test]
  fn short_sentences_yield_placeholder_topic_and_no_key_points() {
    let u = build_fallback_understanding(&content("Hi. Short one. Tiny text here."));
    assert!(u.key_points.is_empty());
    assert_eq!(u.main_topic, "Educational content");
    assert_eq!(u.provenance, Provenance::Heuristic);
  }

  #[test]
  fn arabic_placeholder_when_requested() {
    let mut c = content("مرحبا. نص قصير.");
    c.options.language = Language::Ar;
    let u = build_fallback_understanding(&c);
    assert_eq!(u.main_topic, "محتوى تعليمي");
    assert_eq!(u.detected_language, DetectedLanguage::Ar);
  }

  #[test]
  fn fallback_testable_points_follow_the_recipe() {
    let u = build_fallback_understanding(&content(PASSAGE));
    let understanding_points = u.testable_points.iter().filter(|p| p.kind == PointType::Understanding).count();
    assert_eq!(understanding_points, 3);
    // programming maps to an application point
    assert_eq!(u.testable_points[3].kind, PointType::Application);
    // comparison point last
    assert_eq!(u.testable_points[4].kind, PointType::Analysis);
    assert!(u.testable_points.len() <= MAX_TESTABLE_POINTS);
    assert!(u.concepts.len() <= MAX_CONCEPTS);
  }

  #[test]
  fn importance_and_relations() {
    let u = build_fallback_understanding(&content(PASSAGE));
    let lp = u.concepts.iter().find(|c| c.name == "loop").unwrap();
    assert_eq!(lp.importance, Importance::High);
    assert_eq!(lp.related_to, vec!["function".to_string(), "variable".to_string(), "array".to_string()]);
    assert!(lp.definition.to_lowercase().contains("loop"));
    assert!(u.summary.starts_with("This text covers function, variable, array."));
    assert_eq!(u.key_points.len(), 4);
  }

  #[test]
  fn headings_and_code_stay_out_of_sentences() {
    let text = "# Introduction to Object Oriented Design\n```python\nfor item in collection_of_values: print(item)\n```\n\
      Classes bundle state and behaviour together. Objects are instances of classes that hold their own state.";
    let u = build_fallback_understanding(&content(text));
    assert_eq!(u.main_topic, "Introduction to Object Oriented Design");
    assert!(!u.summary.contains('#'));
    assert!(u.summary.contains("Classes bundle state and behaviour together"));
    assert_eq!(u.key_points[0], "Classes bundle state and behaviour together");
    assert!(u.key_points.iter().all(|k| !k.contains('#') && !k.contains("print(")));
    assert!(u.concepts.iter().all(|c| !c.definition.contains("print(")));
  }

  #[test]
  fn list_lines_become_key_points() {
    let text = "Intro sentence that is long enough to count.\n- first point\n- second point";
    let u = build_fallback_understanding(&content(text));
    assert_eq!(u.key_points, vec!["first point".to_string(), "second point".to_string()]);
  }

  #[test]
  fn file_metadata_overrides_local_detection() {
    let mut c = content(PASSAGE);
    c.file_metadata = Some(FileMetadata {
      detected_language: Some(DetectedLanguage::Mixed),
      complexity: Some(Complexity::Advanced),
      ..Default::default()
    });
    let u = build_fallback_understanding(&c);
    assert_eq!(u.detected_language, DetectedLanguage::Mixed);
    assert_eq!(u.complexity, Complexity::Advanced);
  }

  #[test]
  fn importance_rating() {
    assert_eq!(rate_importance(4, false), Importance::High);
    assert_eq!(rate_importance(1, true), Importance::High);
    assert_eq!(rate_importance(2, false), Importance::Medium);
    assert_eq!(rate_importance(1, false), Importance::Low);
  }
}
