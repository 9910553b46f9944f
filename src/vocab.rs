//! Static lexical tables: bilingual domain vocabularies and stop words.
//!
//! Entries are lower-case. English entries match whole words (plural `s`/`es`
//! allowed); Arabic entries match as substrings to tolerate clitic prefixes.

use crate::domain::Domain;

const PROGRAMMING: &[&str] = &[
  "function", "variable", "algorithm", "programming", "compiler", "software", "database",
  "array", "loop", "python", "java", "debug", "recursion", "code",
  "دالة", "متغير", "خوارزمية", "برمجة", "برنامج", "مصفوفة", "حلقة تكرار", "مترجم",
];

const MATHEMATICS: &[&str] = &[
  "equation", "theorem", "algebra", "calculus", "geometry", "derivative", "integral",
  "matrix", "probability", "formula", "polynomial", "fraction",
  "معادلة", "مبرهنة", "الجبر", "تفاضل", "تكامل", "مثلث", "احتمال", "كسور",
];

const SCIENCE: &[&str] = &[
  "experiment", "hypothesis", "molecule", "energy", "physics", "chemistry", "biology",
  "atom", "organism", "evolution", "photosynthesis", "cells",
  "تجربة", "فرضية", "جزيء", "طاقة", "فيزياء", "كيمياء", "خلية", "كائن حي",
];

const LITERATURE: &[&str] = &[
  "novel", "poem", "poetry", "metaphor", "narrative", "character", "author", "literary",
  "rhyme", "protagonist",
  "رواية", "قصيدة", "الأدب", "قافية", "استعارة", "شخصية", "كاتب",
];

const HISTORY: &[&str] = &[
  "empire", "revolution", "civilization", "century", "dynasty", "ancient", "battle",
  "historical", "kingdom", "colonial", "treaty",
  "تاريخ", "حضارة", "الحرب", "إمبراطورية", "ثورة", "القرن", "مملكة", "معاهدة",
];

const BUSINESS: &[&str] = &[
  "marketing", "revenue", "profit", "management", "investment", "customer", "budget",
  "strategy", "entrepreneur", "finance",
  "تسويق", "شركة", "إدارة", "أرباح", "استثمار", "عميل", "ميزانية", "تمويل",
];

/// Keyword vocabulary for a domain. `General` has none.
pub fn keywords(domain: Domain) -> &'static [&'static str] {
  match domain {
    Domain::Programming => PROGRAMMING,
    Domain::Mathematics => MATHEMATICS,
    Domain::Science => SCIENCE,
    Domain::Literature => LITERATURE,
    Domain::History => HISTORY,
    Domain::Business => BUSINESS,
    Domain::General => &[],
  }
}

/// Words longer than four characters that never make useful concepts.
const STOP_WORDS: &[&str] = &[
  "about", "above", "after", "again", "against", "among", "because", "before", "being",
  "below", "between", "could", "doing", "during", "every", "first", "further", "having",
  "other", "their", "there", "these", "those", "through", "under", "until", "where",
  "which", "while", "would", "should", "shall", "might", "still", "since", "within",
  "without", "another", "however", "something", "example",
  "الذين", "اللذين", "اللتين", "عندما", "بينما", "أيضاً", "أيضا", "التالي", "والتي",
  "والذي", "هؤلاء", "حينما", "ولكن", "لكنها",
];

pub fn is_stop_word(word: &str) -> bool {
  STOP_WORDS.contains(&word)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_classified_domain_has_a_bilingual_vocabulary() {
    for d in Domain::CLASSIFIED {
      let kws = keywords(d);
      assert!(kws.iter().any(|k| k.is_ascii()), "{:?} lacks English keywords", d);
      assert!(kws.iter().any(|k| !k.is_ascii()), "{:?} lacks Arabic keywords", d);
    }
    assert!(keywords(Domain::General).is_empty());
  }

  #[test]
  fn keywords_are_lowercase() {
    for d in Domain::CLASSIFIED {
      for k in keywords(d) {
        assert_eq!(*k, k.to_lowercase());
      }
    }
  }
}
