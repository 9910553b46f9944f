//! Heuristic question synthesis from an Understanding.
//!
//! Budget: ceil(0.6 n) concept questions, ceil(0.4 n) testable-point
//! questions, one comparison question when two or more concepts exist, then
//! truncate to n. Multiple-choice items are built with the correct statement
//! first and handed to an `OptionOrdering` for final placement.

use rand::seq::SliceRandom;
use uuid::Uuid;

use crate::domain::{
  CognitiveLevel, Difficulty, GenerationOptions, Language, PointType, Provenance, Question, QuestionType,
  TestablePoint, Understanding,
};
use crate::templates::{
  domain_label, Localized, COMPARISON_EXPLANATION, COMPARISON_QUESTION, CONCEPT_DEFINITION, CONCEPT_EXPLANATION,
  CONCEPT_PHRASINGS, DISTRACTORS, POINT_EXPLANATION, POINT_OPEN_QUESTION, POINT_QUESTION,
};
use crate::util::{fill_template, truncate_chars};

/// Longest option text we emit.
pub const OPTION_CHARS: usize = 150;

/// Decides where the correct option ends up.
///
/// `options[0]` is the correct statement on entry. Returns the arranged
/// options and the index of the correct one.
pub trait OptionOrdering: Send + Sync {
  fn arrange(&self, options: Vec<String>) -> (Vec<String>, usize);
}

/// Keep the correct statement at index 0.
#[derive(Clone, Copy, Debug, Default)]
pub struct CorrectFirst;

impl OptionOrdering for CorrectFirst {
  fn arrange(&self, options: Vec<String>) -> (Vec<String>, usize) {
    (options, 0)
  }
}

/// Random placement.
#[derive(Clone, Copy, Debug, Default)]
pub struct Shuffled;

impl OptionOrdering for Shuffled {
  fn arrange(&self, options: Vec<String>) -> (Vec<String>, usize) {
    let mut tagged: Vec<(bool, String)> = options.into_iter().enumerate().map(|(i, o)| (i == 0, o)).collect();
    tagged.shuffle(&mut rand::thread_rng());
    let correct = tagged.iter().position(|(is_correct, _)| *is_correct).unwrap_or(0);
    (tagged.into_iter().map(|(_, o)| o).collect(), correct)
  }
}

/// Correct statement plus the three templated distractors about `concept`.
pub(crate) fn choice_options(correct: String, concept: &str, topic: &str, lang: Language) -> Vec<String> {
  let mut options = vec![truncate_chars(&correct, OPTION_CHARS)];
  options.extend(
    DISTRACTORS
      .iter()
      .map(|d| fill_template(d.get(lang), &[("concept", concept), ("topic", topic)])),
  );
  options
}

pub(crate) fn new_question_id() -> String {
  Uuid::new_v4().to_string()
}

/// ceil(n * 3 / 5) and ceil(n * 2 / 5), in integers.
pub fn budget(n: usize) -> (usize, usize) {
  ((n * 3 + 4) / 5, (n * 2 + 4) / 5)
}

pub struct FallbackQuestionGenerator<'a> {
  ordering: &'a dyn OptionOrdering,
}

impl<'a> FallbackQuestionGenerator<'a> {
  pub fn new(ordering: &'a dyn OptionOrdering) -> Self {
    Self { ordering }
  }

  pub fn generate(&self, u: &Understanding, options: &GenerationOptions) -> Vec<Question> {
    let n = options.question_count;
    let (concept_quota, point_quota) = budget(n);
    let ctx = Ctx {
      lang: options.language,
      fixed: options.difficulty.fixed(),
      topic: u.main_topic.as_str(),
      category: domain_label(u.domain, options.language),
      default_difficulty: u.complexity.implied_difficulty(),
    };

    let mut out: Vec<Question> = Vec::new();
    for concept in u.concepts.iter().take(concept_quota) {
      out.push(self.concept_question(&ctx, &concept.name, &concept.definition));
    }
    let subject = u.concepts.first().map(|c| c.name.as_str()).unwrap_or(ctx.topic);
    for point in u.testable_points.iter().take(point_quota) {
      out.push(self.point_question(&ctx, point, subject, u));
    }
    if let [a, b, ..] = u.concepts.as_slice() {
      out.push(comparison_question(&ctx, &a.name, &b.name));
    }
    out.truncate(n);
    out
  }

  fn concept_question(&self, ctx: &Ctx<'_>, name: &str, definition: &str) -> Question {
    let phrasing = CONCEPT_PHRASINGS.choose(&mut rand::thread_rng()).unwrap_or(&CONCEPT_PHRASINGS[0]);
    let definition = if definition.trim().is_empty() {
      fill_template(CONCEPT_DEFINITION.get(ctx.lang), &[("concept", name), ("topic", ctx.topic)])
    } else {
      definition.trim().to_string()
    };
    let (options, correct) = self.ordering.arrange(choice_options(definition.clone(), name, ctx.topic, ctx.lang));

    Question {
      id: new_question_id(),
      text: fill_template(phrasing.get(ctx.lang), &[("concept", name), ("topic", ctx.topic)]),
      kind: QuestionType::MultipleChoice,
      options,
      correct_answer: Some(correct),
      explanation: fill_template(CONCEPT_EXPLANATION.get(ctx.lang), &[("concept", name), ("definition", &definition)]),
      difficulty: ctx.fixed.unwrap_or(ctx.default_difficulty),
      category: ctx.category.to_string(),
      cognitive_level: CognitiveLevel::Comprehension,
      related_concept: Some(name.to_string()),
      provenance: Provenance::Heuristic,
    }
  }

  fn point_question(&self, ctx: &Ctx<'_>, p: &TestablePoint, subject: &str, u: &Understanding) -> Question {
    let explanation = fill_template(POINT_EXPLANATION.get(ctx.lang), &[("point", &p.point), ("why", &p.why)]);
    let related_concept = u
      .concepts
      .iter()
      .find(|c| p.point.to_lowercase().contains(&c.name.to_lowercase()))
      .map(|c| c.name.clone());

    let (kind, text, options, correct_answer) = match p.kind {
      PointType::Understanding | PointType::Application => {
        let correct = if p.why.trim().is_empty() { p.point.clone() } else { p.why.clone() };
        let about = related_concept.as_deref().unwrap_or(subject);
        let (options, idx) = self.ordering.arrange(choice_options(correct, about, ctx.topic, ctx.lang));
        (QuestionType::MultipleChoice, localized(&POINT_QUESTION, ctx.lang, &p.point), options, Some(idx))
      }
      PointType::Analysis => (QuestionType::OpenEnded, localized(&POINT_OPEN_QUESTION, ctx.lang, &p.point), vec![], None),
    };

    Question {
      id: new_question_id(),
      text,
      kind,
      options,
      correct_answer,
      explanation,
      difficulty: ctx.fixed.unwrap_or(p.difficulty),
      category: ctx.category.to_string(),
      cognitive_level: p.kind.cognitive_level(),
      related_concept,
      provenance: Provenance::Heuristic,
    }
  }
}

struct Ctx<'a> {
  lang: Language,
  fixed: Option<Difficulty>,
  topic: &'a str,
  category: &'static str,
  default_difficulty: Difficulty,
}

fn localized(tpl: &Localized, lang: Language, point: &str) -> String {
  fill_template(tpl.get(lang), &[("point", point)])
}

fn comparison_question(ctx: &Ctx<'_>, a: &str, b: &str) -> Question {
  Question {
    id: new_question_id(),
    text: fill_template(COMPARISON_QUESTION.get(ctx.lang), &[("a", a), ("b", b)]),
    kind: QuestionType::OpenEnded,
    options: vec![],
    correct_answer: None,
    explanation: fill_template(COMPARISON_EXPLANATION.get(ctx.lang), &[("a", a), ("b", b)]),
    difficulty: ctx.fixed.unwrap_or(Difficulty::Hard),
    category: ctx.category.to_string(),
    cognitive_level: CognitiveLevel::Analysis,
    related_concept: Some(a.to_string()),
    provenance: Provenance::Heuristic,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{
    Complexity, Concept, DetectedLanguage, Domain, Importance, RequestedDifficulty,
  };

  fn concept(name: &str) -> Concept {
    Concept {
      name: name.into(),
      definition: format!("{name} is defined in chapter one."),
      importance: Importance::Medium,
      related_to: vec![],
    }
  }

  fn point(text: &str, kind: PointType) -> TestablePoint {
    TestablePoint { point: text.into(), kind, difficulty: Difficulty::Medium, why: "it matters".into() }
  }

  fn understanding(concepts: usize, points: Vec<TestablePoint>) -> Understanding {
    Understanding {
      summary: "s".into(),
      main_topic: "Loops".into(),
      key_points: vec![],
      concepts: (0..concepts).map(|i| concept(&format!("concept{i}"))).collect(),
      testable_points: points,
      detected_language: DetectedLanguage::En,
      complexity: Complexity::Beginner,
      domain: Domain::Programming,
      provenance: Provenance::Heuristic,
    }
  }

  fn opts(n: usize) -> GenerationOptions {
    GenerationOptions { question_count: n, ..Default::default() }
  }

  #[test]
  fn budget_rounds_up() {
    assert_eq!(budget(5), (3, 2));
    assert_eq!(budget(1), (1, 1));
    assert_eq!(budget(10), (6, 4));
    assert_eq!(budget(7), (5, 3));
  }

  #[test]
  fn five_questions_from_three_concepts_and_two_points() {
    let u = understanding(3, vec![point("trace concept0", PointType::Application), point("p2", PointType::Analysis)]);
    let qs = FallbackQuestionGenerator::new(&CorrectFirst).generate(&u, &opts(5));
    assert_eq!(qs.len(), 5);
    let concept_qs = qs.iter().filter(|q| q.cognitive_level == CognitiveLevel::Comprehension).count();
    assert_eq!(concept_qs, 3);
    assert_eq!(qs[3].cognitive_level, CognitiveLevel::Application);
    assert_eq!(qs[3].related_concept.as_deref(), Some("concept0"));
    assert_eq!(qs[4].kind, QuestionType::OpenEnded);
    // the comparison question was truncated away
    assert!(!qs.iter().any(|q| q.text.starts_with("Compare")));
  }

  #[test]
  fn multiple_choice_items_have_four_options_and_answer_zero() {
    let u = understanding(4, vec![point("a", PointType::Understanding), point("b", PointType::Application)]);
    let qs = FallbackQuestionGenerator::new(&CorrectFirst).generate(&u, &opts(10));
    let mc: Vec<&Question> = qs.iter().filter(|q| q.kind == QuestionType::MultipleChoice).collect();
    assert!(!mc.is_empty());
    for q in mc {
      assert_eq!(q.options.len(), 4);
      assert_eq!(q.correct_answer, Some(0));
      assert_eq!(q.provenance, Provenance::Heuristic);
    }
  }

  #[test]
  fn point_distractors_follow_the_point_concept() {
    let u = understanding(2, vec![point("Understand the concept of concept1", PointType::Understanding)]);
    let qs = FallbackQuestionGenerator::new(&CorrectFirst).generate(&u, &opts(3));
    let q = &qs[2];
    assert_eq!(q.related_concept.as_deref(), Some("concept1"));
    assert!(q.options[1].contains("concept1"));
    assert!(q.options.iter().all(|o| !o.contains("concept0")));
  }

  #[test]
  fn count_is_bounded_by_available_material() {
    // 2 concepts (quota 6) + 1 point (quota 4) + comparison = 4
    let u = understanding(2, vec![point("a", PointType::Understanding)]);
    let qs = FallbackQuestionGenerator::new(&CorrectFirst).generate(&u, &opts(10));
    assert_eq!(qs.len(), 4);
    assert_eq!(qs[3].cognitive_level, CognitiveLevel::Analysis);
    assert_eq!(qs[3].difficulty, Difficulty::Hard);
  }

  #[test]
  fn fixed_difficulty_applies_everywhere() {
    let u = understanding(3, vec![point("a", PointType::Analysis)]);
    let o = GenerationOptions { question_count: 10, difficulty: RequestedDifficulty::Easy, ..Default::default() };
    let qs = FallbackQuestionGenerator::new(&CorrectFirst).generate(&u, &o);
    assert!(qs.iter().all(|q| q.difficulty == Difficulty::Easy));
  }

  #[test]
  fn mixed_difficulty_follows_complexity_and_points() {
    let u = understanding(1, vec![point("a", PointType::Understanding)]);
    let qs = FallbackQuestionGenerator::new(&CorrectFirst).generate(&u, &opts(2));
    assert_eq!(qs[0].difficulty, Difficulty::Easy);
    assert_eq!(qs[1].difficulty, Difficulty::Medium);
  }

  #[test]
  fn empty_understanding_yields_nothing() {
    let u = understanding(0, vec![]);
    assert!(FallbackQuestionGenerator::new(&CorrectFirst).generate(&u, &opts(3)).is_empty());
  }

  #[test]
  fn arabic_questions_use_arabic_templates() {
    let u = understanding(1, vec![]);
    let o = GenerationOptions { question_count: 1, language: Language::Ar, ..Default::default() };
    let qs = FallbackQuestionGenerator::new(&CorrectFirst).generate(&u, &o);
    assert_eq!(qs[0].category, "البرمجة");
    assert!(qs[0].options[1].contains("concept0"));
  }

  #[test]
  fn shuffled_ordering_tracks_the_correct_option() {
    let options = vec!["right".to_string(), "w1".into(), "w2".into(), "w3".into()];
    for _ in 0..20 {
      let (arranged, idx) = Shuffled.arrange(options.clone());
      assert_eq!(arranged.len(), 4);
      assert_eq!(arranged[idx], "right");
    }
  }
}
