//! Domain models used by the pipeline: content input, options, understanding, questions, result.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{FailureKind, PipelineError};

/// Language requested for generated prose.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
  Ar,
  En,
}
impl Default for Language {
  fn default() -> Self { Language::En }
}

/// Language detected in a text. Always one of these four values.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DetectedLanguage {
  Ar,
  En,
  Mixed,
  Unknown,
}

/// Closed set of subject domains. Declaration order is the classification order.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
  Programming,
  Mathematics,
  Science,
  Literature,
  History,
  Business,
  General,
}

impl Domain {
  /// Domains that carry a keyword vocabulary, in classification order.
  pub const CLASSIFIED: [Domain; 6] = [
    Domain::Programming,
    Domain::Mathematics,
    Domain::Science,
    Domain::Literature,
    Domain::History,
    Domain::Business,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Domain::Programming => "programming",
      Domain::Mathematics => "mathematics",
      Domain::Science => "science",
      Domain::Literature => "literature",
      Domain::History => "history",
      Domain::Business => "business",
      Domain::General => "general",
    }
  }

  /// Lenient parse used on remote payloads. Unknown labels yield None.
  pub fn parse(label: &str) -> Option<Domain> {
    let l = label.trim().to_lowercase();
    Domain::CLASSIFIED
      .iter()
      .chain(std::iter::once(&Domain::General))
      .find(|d| d.as_str() == l)
      .copied()
  }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
  Beginner,
  Intermediate,
  Advanced,
}

impl Complexity {
  pub fn parse(label: &str) -> Option<Complexity> {
    match label.trim().to_lowercase().as_str() {
      "beginner" | "basic" | "easy" => Some(Complexity::Beginner),
      "intermediate" | "medium" => Some(Complexity::Intermediate),
      "advanced" | "hard" => Some(Complexity::Advanced),
      _ => None,
    }
  }

  /// Difficulty a learner would perceive for material at this level.
  pub fn implied_difficulty(&self) -> Difficulty {
    match self {
      Complexity::Beginner => Difficulty::Easy,
      Complexity::Intermediate => Difficulty::Medium,
      Complexity::Advanced => Difficulty::Hard,
    }
  }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

impl Difficulty {
  pub fn parse(label: &str) -> Option<Difficulty> {
    match label.trim().to_lowercase().as_str() {
      "easy" => Some(Difficulty::Easy),
      "medium" => Some(Difficulty::Medium),
      "hard" => Some(Difficulty::Hard),
      _ => None,
    }
  }
}

/// Difficulty as requested by the caller; `mixed` lets each question pick its own.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RequestedDifficulty {
  Easy,
  Medium,
  Hard,
  Mixed,
}
impl Default for RequestedDifficulty {
  fn default() -> Self { RequestedDifficulty::Mixed }
}

impl RequestedDifficulty {
  pub fn fixed(&self) -> Option<Difficulty> {
    match self {
      RequestedDifficulty::Easy => Some(Difficulty::Easy),
      RequestedDifficulty::Medium => Some(Difficulty::Medium),
      RequestedDifficulty::Hard => Some(Difficulty::Hard),
      RequestedDifficulty::Mixed => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      RequestedDifficulty::Easy => "easy",
      RequestedDifficulty::Medium => "medium",
      RequestedDifficulty::Hard => "hard",
      RequestedDifficulty::Mixed => "mixed",
    }
  }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
  MultipleChoice,
  OpenEnded,
}

impl QuestionType {
  pub fn as_str(&self) -> &'static str {
    match self {
      QuestionType::MultipleChoice => "multiple_choice",
      QuestionType::OpenEnded => "open_ended",
    }
  }
}

fn default_question_count() -> usize { 10 }
fn default_question_types() -> BTreeSet<QuestionType> {
  BTreeSet::from([QuestionType::MultipleChoice, QuestionType::OpenEnded])
}

/// Caller-supplied generation options. Validated before any stage runs.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
  #[serde(default = "default_question_count")]
  pub question_count: usize,
  #[serde(default)]
  pub difficulty: RequestedDifficulty,
  #[serde(default)]
  pub language: Language,
  #[serde(default = "default_question_types")]
  pub question_types: BTreeSet<QuestionType>,
}

impl Default for GenerationOptions {
  fn default() -> Self {
    Self {
      question_count: default_question_count(),
      difficulty: RequestedDifficulty::default(),
      language: Language::default(),
      question_types: default_question_types(),
    }
  }
}

impl GenerationOptions {
  /// Reject requests no amount of fallback can repair.
  pub fn validate(&self, max_question_count: usize) -> Result<(), PipelineError> {
    if self.question_count == 0 {
      return Err(PipelineError::PreconditionViolation("questionCount must be at least 1".into()));
    }
    if self.question_count > max_question_count {
      return Err(PipelineError::PreconditionViolation(format!(
        "questionCount must not exceed {}",
        max_question_count
      )));
    }
    if self.question_types.is_empty() {
      return Err(PipelineError::PreconditionViolation("questionTypes must not be empty".into()));
    }
    Ok(())
  }
}

/// Metadata produced by the text-extraction collaborator. All fields optional.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
  #[serde(default)] pub word_count: Option<usize>,
  #[serde(default)] pub sentence_count: Option<usize>,
  #[serde(default)] pub paragraph_count: Option<usize>,
  #[serde(default)] pub detected_language: Option<DetectedLanguage>,
  #[serde(default)] pub complexity: Option<Complexity>,
  #[serde(default)] pub structure: Option<serde_json::Value>,
}

/// Immutable pipeline input.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
  pub raw_text: String,
  #[serde(default)]
  pub file_metadata: Option<FileMetadata>,
  #[serde(default)]
  pub options: GenerationOptions,
}

impl Content {
  pub fn new(raw_text: impl Into<String>, options: GenerationOptions) -> Self {
    Self { raw_text: raw_text.into(), file_metadata: None, options }
  }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
  High,
  Medium,
  Low,
}

impl Importance {
  pub fn parse(label: &str) -> Importance {
    match label.trim().to_lowercase().as_str() {
      "high" => Importance::High,
      "low" => Importance::Low,
      _ => Importance::Medium,
    }
  }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
  pub name: String,
  pub definition: String,
  pub importance: Importance,
  #[serde(default)]
  pub related_to: Vec<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PointType {
  Understanding,
  Application,
  Analysis,
}

impl PointType {
  pub fn parse(label: &str) -> PointType {
    match label.trim().to_lowercase().as_str() {
      "application" | "apply" => PointType::Application,
      "analysis" | "analyze" | "analyse" => PointType::Analysis,
      _ => PointType::Understanding,
    }
  }

  pub fn cognitive_level(&self) -> CognitiveLevel {
    match self {
      PointType::Understanding => CognitiveLevel::Comprehension,
      PointType::Application => CognitiveLevel::Application,
      PointType::Analysis => CognitiveLevel::Analysis,
    }
  }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TestablePoint {
  pub point: String,
  #[serde(rename = "type")]
  pub kind: PointType,
  pub difficulty: Difficulty,
  pub why: String,
}

/// Which path produced an artifact.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
  Remote,
  Heuristic,
}

pub const MAX_KEY_POINTS: usize = 5;
pub const MAX_CONCEPTS: usize = 8;
pub const MAX_TESTABLE_POINTS: usize = 6;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Understanding {
  pub summary: String,
  pub main_topic: String,
  pub key_points: Vec<String>,
  pub concepts: Vec<Concept>,
  pub testable_points: Vec<TestablePoint>,
  pub detected_language: DetectedLanguage,
  pub complexity: Complexity,
  pub domain: Domain,
  pub provenance: Provenance,
}

impl Understanding {
  /// Enforce the list bounds regardless of where the lists came from.
  pub fn bounded(mut self) -> Self {
    self.key_points.truncate(MAX_KEY_POINTS);
    self.concepts.truncate(MAX_CONCEPTS);
    self.testable_points.truncate(MAX_TESTABLE_POINTS);
    self
  }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum CognitiveLevel {
  Knowledge,
  Comprehension,
  Application,
  Analysis,
  Synthesis,
  Evaluation,
}

impl CognitiveLevel {
  pub fn parse(label: &str) -> Option<CognitiveLevel> {
    match label.trim().to_lowercase().as_str() {
      "knowledge" | "remember" | "remembering" => Some(CognitiveLevel::Knowledge),
      "comprehension" | "understanding" | "understand" => Some(CognitiveLevel::Comprehension),
      "application" | "apply" => Some(CognitiveLevel::Application),
      "analysis" | "analyze" | "analyse" => Some(CognitiveLevel::Analysis),
      "synthesis" | "create" => Some(CognitiveLevel::Synthesis),
      "evaluation" | "evaluate" => Some(CognitiveLevel::Evaluation),
      _ => None,
    }
  }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
  pub id: String,
  pub text: String,
  #[serde(rename = "type")]
  pub kind: QuestionType,
  /// Exactly four entries for multiple choice, empty for open-ended.
  pub options: Vec<String>,
  pub correct_answer: Option<usize>,
  pub explanation: String,
  pub difficulty: Difficulty,
  pub category: String,
  pub cognitive_level: CognitiveLevel,
  #[serde(default)]
  pub related_concept: Option<String>,
  pub provenance: Provenance,
}

impl Question {
  /// Drop the options of a multiple-choice item, keeping the explanation as the model answer.
  pub fn into_open_ended(mut self) -> Self {
    if self.kind == QuestionType::MultipleChoice {
      if let Some(correct) = self.correct_answer.and_then(|i| self.options.get(i)) {
        self.explanation = format!("{} {}", correct, self.explanation).trim().to_string();
      }
      self.kind = QuestionType::OpenEnded;
      self.options.clear();
      self.correct_answer = None;
    }
    self
  }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GenerationType {
  Remote,
  HeuristicFromUnderstanding,
  DirectHeuristic,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
  pub domain: Domain,
  pub generation_type: GenerationType,
  pub cognitive_distribution: BTreeMap<CognitiveLevel, usize>,
  /// Why the understanding stage fell back, if it did.
  pub understanding_fallback: Option<FailureKind>,
  /// Why question synthesis fell back, if it did.
  pub questions_fallback: Option<FailureKind>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineResult {
  pub understanding: Understanding,
  pub questions: Vec<Question>,
  pub metadata: ResultMetadata,
}

/// Count questions per cognitive level.
pub fn cognitive_distribution(questions: &[Question]) -> BTreeMap<CognitiveLevel, usize> {
  let mut dist = BTreeMap::new();
  for q in questions {
    *dist.entry(q.cognitive_level).or_insert(0) += 1;
  }
  dist
}
