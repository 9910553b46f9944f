//! Last-resort generation straight from raw text, used when the
//! understanding stage could not complete at all.

use crate::analyzer::{assess_complexity, classify_domain, detect_language, extract_concepts, prose, split_sentences};
use crate::domain::{
  CognitiveLevel, Complexity, Content, DetectedLanguage, Domain, Provenance, Question, QuestionType, Understanding,
};
use crate::fallback::{choice_options, new_question_id, OptionOrdering};
use crate::templates::{
  direct_question, domain_label, DIRECT_CORRECT_FALLBACK, DIRECT_EXPLANATION, SUMMARY_EXPLANATION, SUMMARY_QUESTION,
  TOPIC_PLACEHOLDER,
};
use crate::util::{fill_template, truncate_chars};

/// Only the first few terms get answer options; the rest stay open-ended.
pub const CHOICE_ITEMS: usize = 3;

struct Profile {
  detected_language: DetectedLanguage,
  complexity: Complexity,
  domain: Domain,
}

fn profile(content: &Content) -> Profile {
  let text = content.raw_text.as_str();
  let meta = content.file_metadata.as_ref();
  Profile {
    detected_language: meta.and_then(|m| m.detected_language).unwrap_or_else(|| detect_language(text)),
    complexity: meta.and_then(|m| m.complexity).unwrap_or_else(|| assess_complexity(text)),
    domain: classify_domain(text).domain,
  }
}

/// Skeleton Understanding reported alongside direct questions.
pub fn minimal_understanding(content: &Content) -> Understanding {
  let p = profile(content);
  let summary = split_sentences(&prose(&content.raw_text))
    .first()
    .map(|s| truncate_chars(s, 200))
    .unwrap_or_default();
  Understanding {
    summary,
    main_topic: TOPIC_PLACEHOLDER.get(content.options.language).to_string(),
    key_points: vec![],
    concepts: vec![],
    testable_points: vec![],
    detected_language: p.detected_language,
    complexity: p.complexity,
    domain: p.domain,
    provenance: Provenance::Heuristic,
  }
}

pub struct DirectFallbackGenerator<'a> {
  ordering: &'a dyn OptionOrdering,
}

impl<'a> DirectFallbackGenerator<'a> {
  pub fn new(ordering: &'a dyn OptionOrdering) -> Self {
    Self { ordering }
  }

  pub fn generate(&self, content: &Content) -> Vec<Question> {
    let opts = &content.options;
    let lang = opts.language;
    let p = profile(content);
    let label = domain_label(p.domain, lang);
    let difficulty = opts.difficulty.fixed().unwrap_or_else(|| p.complexity.implied_difficulty());
    let terms = extract_concepts(&content.raw_text, p.domain, opts.question_count);

    if terms.is_empty() {
      return vec![Question {
        id: new_question_id(),
        text: SUMMARY_QUESTION.get(lang).to_string(),
        kind: QuestionType::OpenEnded,
        options: vec![],
        correct_answer: None,
        explanation: SUMMARY_EXPLANATION.get(lang).to_string(),
        difficulty,
        category: label.to_string(),
        cognitive_level: CognitiveLevel::Comprehension,
        related_concept: None,
        provenance: Provenance::Heuristic,
      }];
    }

    let sentences = split_sentences(&prose(&content.raw_text));
    let template = direct_question(p.domain);
    terms
      .iter()
      .enumerate()
      .map(|(i, term)| {
        let text = fill_template(template.get(lang), &[("term", term)]);
        let explanation = fill_template(DIRECT_EXPLANATION.get(lang), &[("term", term)]);
        let (kind, options, correct_answer, cognitive_level) = if i < CHOICE_ITEMS {
          let correct = sentences
            .iter()
            .find(|s| s.to_lowercase().contains(term.as_str()))
            .cloned()
            .unwrap_or_else(|| fill_template(DIRECT_CORRECT_FALLBACK.get(lang), &[("term", term), ("topic", label)]));
          let (options, idx) = self.ordering.arrange(choice_options(correct, term, label, lang));
          (QuestionType::MultipleChoice, options, Some(idx), CognitiveLevel::Knowledge)
        } else {
          (QuestionType::OpenEnded, vec![], None, CognitiveLevel::Comprehension)
        };
        Question {
          id: new_question_id(),
          text,
          kind,
          options,
          correct_answer,
          explanation,
          difficulty,
          category: label.to_string(),
          cognitive_level,
          related_concept: Some(term.clone()),
          provenance: Provenance::Heuristic,
        }
      })
      .collect()
  }
}
