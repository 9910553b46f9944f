//! Local text heuristics: language, domain, complexity, concepts and structure.
//!
//! Everything here is a pure function of its input. These functions back the
//! heuristic fallbacks and the `/api/v1/analyze` endpoint.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::domain::{Complexity, DetectedLanguage, Domain};
use crate::util::{count_occurrences, is_arabic, is_latin};
use crate::vocab::{is_stop_word, keywords};

/// Default cap for `extract_concepts`.
pub const CONCEPT_CAP: usize = 15;

/// Arabic/Latin letter ratio classification. Total function: empty input is `Unknown`.
pub fn detect_language(text: &str) -> DetectedLanguage {
  let mut arabic = 0usize;
  let mut latin = 0usize;
  for ch in text.chars() {
    if is_arabic(ch) {
      arabic += 1;
    } else if is_latin(ch) {
      latin += 1;
    }
  }
  let total = arabic + latin;
  if total == 0 {
    return DetectedLanguage::Unknown;
  }
  let ar = arabic as f64 / total as f64;
  let en = latin as f64 / total as f64;
  if ar > 0.7 {
    DetectedLanguage::Ar
  } else if en > 0.7 {
    DetectedLanguage::En
  } else if ar > 0.3 && en > 0.3 {
    DetectedLanguage::Mixed
  } else if ar >= en {
    DetectedLanguage::Ar
  } else {
    DetectedLanguage::En
  }
}

fn is_word_char(ch: char) -> bool {
  // Arabic harakat are combining marks, keep them inside the word.
  ch.is_alphanumeric() || ch == '_' || ('\u{064B}'..='\u{065F}').contains(&ch) || ch == '\u{0670}'
}

/// Lower-cased word tokens.
pub fn words(text: &str) -> Vec<String> {
  text
    .split(|c: char| !is_word_char(c))
    .filter(|w| !w.is_empty())
    .map(|w| w.to_lowercase())
    .collect()
}

/// Sentences split on terminal punctuation (Latin and Arabic) and line breaks.
pub fn split_sentences(text: &str) -> Vec<String> {
  text
    .split(|c: char| matches!(c, '.' | '!' | '?' | '؟' | '\n'))
    .map(|s| s.trim())
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .collect()
}

/// Occurrences of a lower-cased keyword in lower-cased text.
///
/// ASCII keywords match whole words, allowing a plural `s`/`es`. Arabic
/// keywords match as substrings so clitic prefixes such as "ال" still hit.
pub fn keyword_hits(lower: &str, keyword: &str) -> usize {
  if !keyword.is_ascii() {
    return count_occurrences(lower, keyword);
  }
  lower
    .match_indices(keyword)
    .filter(|(at, _)| {
      let starts_word = lower[..*at].chars().next_back().map_or(true, |c| !is_word_char(c));
      let tail = &lower[at + keyword.len()..];
      let ends_word = |s: &str| s.chars().next().map_or(true, |c| !is_word_char(c));
      let ends_plural = tail.strip_prefix('s').is_some_and(ends_word) || tail.strip_prefix("es").is_some_and(ends_word);
      starts_word && (ends_word(tail) || ends_plural)
    })
    .count()
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DomainClassification {
  pub domain: Domain,
  pub confidence: f64,
  pub weights: BTreeMap<Domain, usize>,
}

/// Keyword-weight classification. Ties go to the earliest domain in `Domain::CLASSIFIED`.
pub fn classify_domain(text: &str) -> DomainClassification {
  let lower = text.to_lowercase();
  let mut weights = BTreeMap::new();
  let mut best = Domain::General;
  let mut max_weight = 0usize;

  for domain in Domain::CLASSIFIED {
    let weight: usize = keywords(domain).iter().map(|kw| keyword_hits(&lower, kw)).sum();
    weights.insert(domain, weight);
    if weight > max_weight {
      max_weight = weight;
      best = domain;
    }
  }

  let word_count = words(text).len();
  let confidence = if word_count == 0 {
    0.0
  } else {
    max_weight as f64 / (word_count as f64 / 100.0)
  };

  DomainClassification { domain: best, confidence, weights }
}

/// Three-signal complexity score.
pub fn assess_complexity(text: &str) -> Complexity {
  let tokens = words(text);
  if tokens.is_empty() {
    return Complexity::Beginner;
  }
  let lengths: Vec<usize> = tokens.iter().map(|w| w.chars().count()).collect();
  let avg_word_len = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;
  let sentences = split_sentences(text).len().max(1);
  let avg_sentence_len = tokens.len() as f64 / sentences as f64;
  let long_ratio = lengths.iter().filter(|l| **l > 6).count() as f64 / lengths.len() as f64;

  let score = [avg_word_len > 6.0, avg_sentence_len > 20.0, long_ratio > 0.3]
    .iter()
    .filter(|hit| **hit)
    .count();

  match score {
    0 => Complexity::Beginner,
    1 => Complexity::Intermediate,
    _ => Complexity::Advanced,
  }
}

/// Domain vocabulary hits (vocabulary order) followed by repeated long words
/// (descending frequency, then first occurrence), truncated to `cap`.
pub fn extract_concepts(text: &str, domain: Domain, cap: usize) -> Vec<String> {
  let lower = text.to_lowercase();
  let mut out: Vec<String> = keywords(domain)
    .iter()
    .filter(|kw| keyword_hits(&lower, kw) > 0)
    .map(|kw| kw.to_string())
    .collect();

  // word -> (frequency, first position)
  let mut freq: HashMap<String, (usize, usize)> = HashMap::new();
  for (pos, w) in words(text).into_iter().enumerate() {
    if w.chars().count() <= 4 || is_stop_word(&w) || w.chars().all(|c| c.is_numeric()) {
      continue;
    }
    freq.entry(w).or_insert((0, pos)).0 += 1;
  }

  let mut ranked: Vec<(String, usize, usize)> = freq
    .into_iter()
    .filter(|(w, (n, _))| *n >= 2 && !out.contains(w))
    .map(|(w, (n, pos))| (w, n, pos))
    .collect();
  ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

  out.extend(ranked.into_iter().map(|(w, _, _)| w));
  out.truncate(cap);
  out
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Heading {
  pub level: usize,
  pub text: String,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Structure {
  pub headings: Vec<Heading>,
  pub lists: Vec<String>,
  pub tables: Vec<Vec<String>>,
  pub code_blocks: Vec<String>,
  pub quotes: Vec<String>,
}

fn parse_heading(line: &str) -> Option<Heading> {
  let level = line.chars().take_while(|c| *c == '#').count();
  if level == 0 || level > 6 {
    return None;
  }
  let rest = &line[level..];
  if !rest.starts_with(' ') {
    return None;
  }
  let text = rest.trim().trim_end_matches('#').trim();
  if text.is_empty() { None } else { Some(Heading { level, text: text.to_string() }) }
}

fn parse_list_item(line: &str) -> Option<String> {
  for bullet in ["- ", "* ", "+ ", "• "] {
    if let Some(rest) = line.strip_prefix(bullet) {
      let item = rest.trim();
      return if item.is_empty() { None } else { Some(item.to_string()) };
    }
  }
  let digits = line.chars().take_while(|c| c.is_numeric()).count();
  if digits == 0 {
    return None;
  }
  let rest: String = line.chars().skip(digits).collect();
  let rest = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')'))?;
  if !rest.starts_with(' ') {
    return None;
  }
  let item = rest.trim();
  if item.is_empty() { None } else { Some(item.to_string()) }
}

fn parse_table_row(line: &str) -> Option<Vec<String>> {
  if !line.contains('|') {
    return None;
  }
  let cells: Vec<String> = line
    .split('|')
    .map(|c| c.trim())
    .filter(|c| !c.is_empty())
    .map(str::to_string)
    .collect();
  let separator = cells.iter().all(|c| c.chars().all(|ch| matches!(ch, '-' | ':' | ' ')));
  if cells.len() > 2 && !separator { Some(cells) } else { None }
}

/// Purely syntactic line classification.
pub fn extract_structure(text: &str) -> Structure {
  let mut s = Structure::default();
  let mut in_code = false;
  let mut code_buf: Vec<&str> = Vec::new();

  for line in text.lines() {
    let t = line.trim();
    if t.starts_with("```") {
      if in_code {
        s.code_blocks.push(code_buf.join("\n"));
        code_buf.clear();
      }
      in_code = !in_code;
      continue;
    }
    if in_code {
      code_buf.push(line);
      continue;
    }
    if let Some(h) = parse_heading(t) {
      s.headings.push(h);
    } else if let Some(q) = t.strip_prefix('>') {
      let q = q.trim();
      if !q.is_empty() {
        s.quotes.push(q.to_string());
      }
    } else if let Some(item) = parse_list_item(t) {
      s.lists.push(item);
    } else if let Some(row) = parse_table_row(t) {
      s.tables.push(row);
    }
  }
  if in_code && !code_buf.is_empty() {
    s.code_blocks.push(code_buf.join("\n"));
  }
  s
}

/// Body text without markup: headings, fenced code and table rows are
/// dropped, list bullets and quote markers are stripped.
pub fn prose(text: &str) -> String {
  let mut out: Vec<String> = Vec::new();
  let mut in_code = false;
  for line in text.lines() {
    let t = line.trim();
    if t.starts_with("```") {
      in_code = !in_code;
      continue;
    }
    let table = (t.starts_with('|') && t.ends_with('|')) || parse_table_row(t).is_some();
    if in_code || table || parse_heading(t).is_some() {
      continue;
    }
    if let Some(q) = t.strip_prefix('>') {
      out.push(q.trim().to_string());
    } else if let Some(item) = parse_list_item(t) {
      out.push(item);
    } else {
      out.push(t.to_string());
    }
  }
  out.join("\n")
}

/// Combined local report.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextReport {
  pub detected_language: DetectedLanguage,
  pub classification: DomainClassification,
  pub complexity: Complexity,
  pub concepts: Vec<String>,
  pub structure: Structure,
  pub word_count: usize,
  pub sentence_count: usize,
  pub paragraph_count: usize,
}

pub fn analyze(text: &str) -> TextReport {
  let classification = classify_domain(text);
  let concepts = extract_concepts(text, classification.domain, CONCEPT_CAP);
  TextReport {
    detected_language: detect_language(text),
    complexity: assess_complexity(text),
    concepts,
    structure: extract_structure(text),
    word_count: words(text).len(),
    sentence_count: split_sentences(text).len(),
    paragraph_count: text.split("\n\n").filter(|p| !p.trim().is_empty()).count(),
    classification,
  }
}
