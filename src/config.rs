//! Loading pipeline configuration (gateway, generation knobs, prompts) from TOML.
//!
//! See `PipelineConfig` and `Prompts` for expected schema. Every section is
//! optional; missing values use the defaults below.

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::Language;
use crate::gateway::{CompletionOptions, ModelAlias};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct PipelineConfig {
  #[serde(default)]
  pub gateway: GatewayConfig,
  #[serde(default)]
  pub generation: GenerationConfig,
  #[serde(default)]
  pub prompts: Prompts,
}

/// Remote provider settings. The API key is never read from TOML.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
  pub base_url: String,
  pub timeout_secs: u64,
  pub models: ModelTable,
}

impl Default for GatewayConfig {
  fn default() -> Self {
    Self { base_url: "https://api.openai.com/v1".into(), timeout_secs: 60, models: ModelTable::default() }
  }
}

/// Alias -> concrete model identifier.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ModelTable {
  pub text: String,
  pub chat: String,
  pub analysis: String,
  pub coding: String,
}

impl Default for ModelTable {
  fn default() -> Self {
    Self {
      text: "gpt-4o-mini".into(),
      chat: "gpt-4o-mini".into(),
      analysis: "gpt-4o".into(),
      coding: "gpt-4o".into(),
    }
  }
}

impl ModelTable {
  pub fn resolve(&self, alias: ModelAlias) -> &str {
    match alias {
      ModelAlias::Text => &self.text,
      ModelAlias::Chat => &self.chat,
      ModelAlias::Analysis => &self.analysis,
      ModelAlias::Coding => &self.coding,
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
  pub max_question_count: usize,
  /// Randomize the position of the correct option in heuristic questions.
  pub shuffle_options: bool,
  pub understanding: CompletionOptions,
  pub questions: CompletionOptions,
}

impl Default for GenerationConfig {
  fn default() -> Self {
    Self {
      max_question_count: 50,
      shuffle_options: false,
      understanding: CompletionOptions { max_tokens: 2000, temperature: 0.3, top_p: 0.9, ..Default::default() },
      questions: CompletionOptions {
        max_tokens: 3000,
        temperature: 0.7,
        top_p: 0.9,
        frequency_penalty: 0.3,
        presence_penalty: 0.2,
      },
    }
  }
}

/// Which prompt a stage needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Task {
  Understanding,
  Questions,
}

/// Prompt templates indexed by (task, language). Override any of them in TOML.
///
/// Placeholders: understanding uses `{content}`; questions use `{summary}`,
/// `{main_topic}`, `{key_points}`, `{concepts}`, `{testable_points}`,
/// `{complexity}`, `{question_count}`, `{difficulty}`, `{question_types}`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub understanding_en: String,
  pub understanding_ar: String,
  pub questions_en: String,
  pub questions_ar: String,
}

impl Prompts {
  pub fn template(&self, task: Task, lang: Language) -> &str {
    match (task, lang) {
      (Task::Understanding, Language::En) => &self.understanding_en,
      (Task::Understanding, Language::Ar) => &self.understanding_ar,
      (Task::Questions, Language::En) => &self.questions_en,
      (Task::Questions, Language::Ar) => &self.questions_ar,
    }
  }
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      understanding_en: r#"You are an expert educator. Read the text below and build a structured understanding of it.

Return ONLY a JSON object with these keys:
  "summary": string, 2-3 sentences
  "mainTopic": string
  "keyPoints": array of at most 5 strings
  "concepts": array of at most 8 objects {"name", "definition", "importance": "high"|"medium"|"low", "relatedTo": [string]}
  "testablePoints": array of at most 6 objects {"point", "type": "understanding"|"application"|"analysis", "difficulty": "easy"|"medium"|"hard", "why"}
  "complexity": "beginner"|"intermediate"|"advanced"
  "domain": "programming"|"mathematics"|"science"|"literature"|"history"|"business"|"general"

Write every value in English.

TEXT:
{content}"#
        .into(),
      understanding_ar: r#"أنت معلم خبير. اقرأ النص التالي وابنِ فهماً منظماً له.

أعد كائن JSON فقط يحتوي على المفاتيح التالية (بأسمائها الإنجليزية):
  "summary": نص من جملتين إلى ثلاث
  "mainTopic": نص
  "keyPoints": مصفوفة من 5 نصوص على الأكثر
  "concepts": مصفوفة من 8 كائنات على الأكثر {"name", "definition", "importance": "high"|"medium"|"low", "relatedTo": [نص]}
  "testablePoints": مصفوفة من 6 كائنات على الأكثر {"point", "type": "understanding"|"application"|"analysis", "difficulty": "easy"|"medium"|"hard", "why"}
  "complexity": "beginner"|"intermediate"|"advanced"
  "domain": "programming"|"mathematics"|"science"|"literature"|"history"|"business"|"general"

اكتب جميع القيم باللغة العربية.

النص:
{content}"#
        .into(),
      questions_en: r#"You are an assessment designer. Using the understanding below, write {question_count} questions.

Summary: {summary}
Main topic: {main_topic}
Key points:
{key_points}
Concepts:
{concepts}
Testable points:
{testable_points}
Complexity: {complexity}
Requested difficulty: {difficulty}
Allowed question types: {question_types}

Return ONLY a JSON object {"questions": [...]} where each item has:
  "text", "type": "multiple_choice"|"open_ended",
  "options": exactly 4 strings for multiple_choice, [] for open_ended,
  "correctAnswer": index 0-3 for multiple_choice, null for open_ended,
  "explanation", "difficulty": "easy"|"medium"|"hard",
  "cognitiveLevel": "knowledge"|"comprehension"|"application"|"analysis"|"synthesis"|"evaluation",
  "relatedConcept": string or null
Write every question in English."#
        .into(),
      questions_ar: r#"أنت مصمم اختبارات. اعتماداً على الفهم التالي، اكتب {question_count} سؤالاً.

الملخص: {summary}
الموضوع الرئيسي: {main_topic}
النقاط الرئيسية:
{key_points}
المفاهيم:
{concepts}
النقاط القابلة للاختبار:
{testable_points}
مستوى التعقيد: {complexity}
الصعوبة المطلوبة: {difficulty}
أنواع الأسئلة المسموحة: {question_types}

أعد كائن JSON فقط بالشكل {"questions": [...]} حيث يحتوي كل عنصر على:
  "text"، "type": "multiple_choice"|"open_ended"،
  "options": أربعة نصوص بالضبط للاختيار من متعدد، [] للأسئلة المفتوحة،
  "correctAnswer": رقم من 0 إلى 3 للاختيار من متعدد، null للأسئلة المفتوحة،
  "explanation"، "difficulty": "easy"|"medium"|"hard"،
  "cognitiveLevel": "knowledge"|"comprehension"|"application"|"analysis"|"synthesis"|"evaluation"،
  "relatedConcept": نص أو null
اكتب جميع الأسئلة باللغة العربية."#
        .into(),
    }
  }
}

/// Attempt to load `PipelineConfig` from PIPELINE_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_pipeline_config_from_env() -> Option<PipelineConfig> {
  let path = std::env::var("PIPELINE_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<PipelineConfig>(&s) {
      Ok(cfg) => {
        info!(target: "quizforge_backend", %path, "Loaded pipeline config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "quizforge_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "quizforge_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_toml_keeps_defaults() {
    let cfg: PipelineConfig = toml::from_str(
      r#"
        [gateway]
        timeout_secs = 30
        [gateway.models]
        coding = "code-model"
        [generation]
        shuffle_options = true
        [generation.questions]
        max_tokens = 1000
        temperature = 0.5
        top_p = 1.0
        frequency_penalty = 0.0
        presence_penalty = 0.0
        [prompts]
        questions_en = "Q {question_count}"
      "#,
    )
    .unwrap();
    assert_eq!(cfg.gateway.timeout_secs, 30);
    assert_eq!(cfg.gateway.base_url, "https://api.openai.com/v1");
    assert_eq!(cfg.gateway.models.resolve(ModelAlias::Coding), "code-model");
    assert_eq!(cfg.gateway.models.resolve(ModelAlias::Chat), "gpt-4o-mini");
    assert!(cfg.generation.shuffle_options);
    assert_eq!(cfg.generation.max_question_count, 50);
    assert_eq!(cfg.generation.questions.max_tokens, 1000);
    assert_eq!(cfg.prompts.template(Task::Questions, Language::En), "Q {question_count}");
    assert!(cfg.prompts.template(Task::Understanding, Language::Ar).contains("{content}"));
  }

  #[test]
  fn default_prompts_carry_their_placeholders() {
    let p = Prompts::default();
    for lang in [Language::En, Language::Ar] {
      assert!(p.template(Task::Understanding, lang).contains("{content}"));
      let q = p.template(Task::Questions, lang);
      for key in ["{summary}", "{concepts}", "{testable_points}", "{complexity}", "{question_count}"] {
        assert!(q.contains(key), "{key} missing for {:?}", lang);
      }
    }
  }

  #[test]
  fn default_timeout_is_sixty_seconds() {
    assert_eq!(PipelineConfig::default().gateway.timeout_secs, 60);
  }
}
