//! Localized text tables for the heuristic generators.
//!
//! All wording used by the local fallbacks lives here as data, keyed by
//! language. Placeholders are filled with `util::fill_template`.

use crate::domain::{Difficulty, Domain, Language, PointType};

/// One phrase in both supported languages.
#[derive(Clone, Copy, Debug)]
pub struct Localized {
  pub en: &'static str,
  pub ar: &'static str,
}

impl Localized {
  pub const fn new(en: &'static str, ar: &'static str) -> Self {
    Self { en, ar }
  }

  pub fn get(&self, lang: Language) -> &'static str {
    match lang {
      Language::En => self.en,
      Language::Ar => self.ar,
    }
  }
}

pub const TOPIC_PLACEHOLDER: Localized = Localized::new("Educational content", "محتوى تعليمي");

pub const SUMMARY_WITH_CONCEPTS: Localized = Localized::new(
  "This text covers {concepts}. {fragment}",
  "يتناول هذا النص {concepts}. {fragment}",
);
pub const SUMMARY_WITHOUT_CONCEPTS: Localized = Localized::new(
  "This text discusses {topic}. {fragment}",
  "يناقش هذا النص {topic}. {fragment}",
);

pub const CONCEPT_DEFINITION: Localized = Localized::new(
  "{concept}: a key idea discussed in the context of {topic}.",
  "{concept}: فكرة أساسية يناقشها النص في سياق {topic}.",
);

pub const LIST_SEPARATOR: Localized = Localized::new(", ", "، ");

pub const UNDERSTAND_POINT: Localized = Localized::new(
  "Understand the concept of {concept}",
  "فهم مفهوم {concept}",
);
pub const UNDERSTAND_WHY: Localized = Localized::new(
  "{concept} is one of the central ideas of the text.",
  "يعد {concept} من الأفكار المحورية في النص.",
);

pub const COMPARE_POINT: Localized = Localized::new(
  "Compare {a} and {b} and explain how they relate",
  "المقارنة بين {a} و{b} وبيان العلاقة بينهما",
);
pub const COMPARE_WHY: Localized = Localized::new(
  "Relating two ideas shows deeper understanding than recalling either one.",
  "الربط بين فكرتين يكشف فهماً أعمق من تذكر كل منهما.",
);

/// Domain-specific testable point: type, difficulty, point template, rationale.
pub struct DomainPoint {
  pub kind: PointType,
  pub difficulty: Difficulty,
  pub point: Localized,
  pub why: Localized,
}

pub fn domain_point(domain: Domain) -> DomainPoint {
  match domain {
    Domain::Programming => DomainPoint {
      kind: PointType::Application,
      difficulty: Difficulty::Medium,
      point: Localized::new(
        "Apply {concept} in a short program or trace its execution",
        "تطبيق {concept} في برنامج قصير أو تتبع تنفيذه",
      ),
      why: Localized::new("Programming knowledge is shown by using it in code.", "تظهر المعرفة البرمجية عند استخدامها في الشيفرة."),
    },
    Domain::Mathematics => DomainPoint {
      kind: PointType::Application,
      difficulty: Difficulty::Medium,
      point: Localized::new("Use {concept} to solve a concrete problem", "استخدام {concept} لحل مسألة محددة"),
      why: Localized::new("Mathematical ideas are mastered by solving problems.", "تُتقن الأفكار الرياضية بحل المسائل."),
    },
    Domain::Science => DomainPoint {
      kind: PointType::Analysis,
      difficulty: Difficulty::Hard,
      point: Localized::new(
        "Explain the cause-and-effect relationships involving {concept}",
        "تفسير علاقات السبب والنتيجة المرتبطة بـ{concept}",
      ),
      why: Localized::new("Science rests on explaining why phenomena occur.", "يقوم العلم على تفسير أسباب الظواهر."),
    },
    Domain::Literature => DomainPoint {
      kind: PointType::Analysis,
      difficulty: Difficulty::Hard,
      point: Localized::new(
        "Analyze how {concept} shapes the meaning of the text",
        "تحليل كيفية إسهام {concept} في تشكيل معنى النص",
      ),
      why: Localized::new("Literary study asks how form creates meaning.", "تبحث الدراسة الأدبية في كيفية صناعة الشكل للمعنى."),
    },
    Domain::History => DomainPoint {
      kind: PointType::Analysis,
      difficulty: Difficulty::Hard,
      point: Localized::new(
        "Analyze the causes and consequences related to {concept}",
        "تحليل الأسباب والنتائج المتعلقة بـ{concept}",
      ),
      why: Localized::new("Historical understanding links events to causes and outcomes.", "يربط الفهم التاريخي الأحداث بأسبابها ونتائجها."),
    },
    Domain::Business => DomainPoint {
      kind: PointType::Application,
      difficulty: Difficulty::Medium,
      point: Localized::new(
        "Apply {concept} to a realistic business scenario",
        "تطبيق {concept} على موقف واقعي في بيئة الأعمال",
      ),
      why: Localized::new("Business concepts matter when they guide decisions.", "تكتسب مفاهيم الأعمال قيمتها عندما توجه القرارات."),
    },
    Domain::General => DomainPoint {
      kind: PointType::Application,
      difficulty: Difficulty::Medium,
      point: Localized::new("Relate {concept} to a real-life situation", "ربط {concept} بموقف من الحياة الواقعية"),
      why: Localized::new("Transfer to new situations shows real understanding.", "نقل المعرفة إلى مواقف جديدة دليل على الفهم الحقيقي."),
    },
  }
}

pub fn domain_label(domain: Domain, lang: Language) -> &'static str {
  let l = match domain {
    Domain::Programming => Localized::new("programming", "البرمجة"),
    Domain::Mathematics => Localized::new("mathematics", "الرياضيات"),
    Domain::Science => Localized::new("science", "العلوم"),
    Domain::Literature => Localized::new("literature", "الأدب"),
    Domain::History => Localized::new("history", "التاريخ"),
    Domain::Business => Localized::new("business", "الأعمال"),
    Domain::General => Localized::new("general knowledge", "المعرفة العامة"),
  };
  l.get(lang)
}

/// Concept-question phrasings. One is picked at random per question.
pub const CONCEPT_PHRASINGS: &[Localized] = &[
  // definition
  Localized::new(
    "Which of the following best defines \"{concept}\"?",
    "أي مما يلي يعرّف \"{concept}\" بشكل أدق؟",
  ),
  // purpose
  Localized::new(
    "What is the main purpose of \"{concept}\" in the context of {topic}?",
    "ما الغرض الرئيسي من \"{concept}\" في سياق {topic}؟",
  ),
  // application
  Localized::new(
    "Which statement correctly describes how \"{concept}\" is applied?",
    "أي عبارة تصف بشكل صحيح كيفية تطبيق \"{concept}\"؟",
  ),
  // importance
  Localized::new(
    "Why is \"{concept}\" important according to the text?",
    "لماذا يعد \"{concept}\" مهماً وفقاً للنص؟",
  ),
];

/// Plausible-but-wrong statements about a concept.
pub const DISTRACTORS: [Localized; 3] = [
  Localized::new(
    "{concept} is unrelated to {topic} and is mentioned only in passing.",
    "{concept} لا علاقة له بـ{topic} وقد ذُكر عرضاً فقط.",
  ),
  Localized::new(
    "{concept} is an outdated idea that the text recommends avoiding.",
    "{concept} فكرة قديمة ينصح النص بتجنبها.",
  ),
  Localized::new(
    "{concept} applies only outside of {topic}, in unrelated situations.",
    "{concept} ينطبق فقط خارج نطاق {topic} في مواقف لا صلة لها به.",
  ),
];

pub const CONCEPT_EXPLANATION: Localized = Localized::new(
  "The text presents {concept} as follows: {definition}",
  "يعرض النص {concept} على النحو التالي: {definition}",
);

pub const POINT_QUESTION: Localized = Localized::new(
  "Which statement best supports the following objective: {point}?",
  "أي عبارة تدعم الهدف التالي على أفضل وجه: {point}؟",
);
pub const POINT_OPEN_QUESTION: Localized = Localized::new(
  "{point}. Support your answer with evidence from the text.",
  "{point}. ادعم إجابتك بأدلة من النص.",
);
pub const POINT_EXPLANATION: Localized = Localized::new(
  "This targets the objective \"{point}\": {why}",
  "يستهدف هذا السؤال الهدف \"{point}\": {why}",
);

pub const COMPARISON_QUESTION: Localized = Localized::new(
  "Compare \"{a}\" and \"{b}\" as presented in the text. How are they related?",
  "قارن بين \"{a}\" و\"{b}\" كما وردا في النص. ما العلاقة بينهما؟",
);
pub const COMPARISON_EXPLANATION: Localized = Localized::new(
  "A good answer names what {a} and {b} share and where they differ.",
  "الإجابة الجيدة تذكر ما يشترك فيه {a} و{b} وما يختلفان فيه.",
);

/// Direct-from-text question template per domain.
pub fn direct_question(domain: Domain) -> Localized {
  match domain {
    Domain::Programming => Localized::new(
      "What role does \"{term}\" play in the program or concept described?",
      "ما دور \"{term}\" في البرنامج أو المفهوم الموصوف؟",
    ),
    Domain::Mathematics => Localized::new(
      "How is \"{term}\" used in the mathematical reasoning of the text?",
      "كيف يُستخدم \"{term}\" في الاستدلال الرياضي الوارد في النص؟",
    ),
    Domain::Science => Localized::new(
      "What scientific role does \"{term}\" have in the text?",
      "ما الدور العلمي لـ\"{term}\" في النص؟",
    ),
    Domain::Literature => Localized::new(
      "What is the significance of \"{term}\" in the literary text?",
      "ما دلالة \"{term}\" في النص الأدبي؟",
    ),
    Domain::History => Localized::new(
      "What historical significance does \"{term}\" have according to the text?",
      "ما الأهمية التاريخية لـ\"{term}\" وفقاً للنص؟",
    ),
    Domain::Business => Localized::new(
      "How does \"{term}\" affect business decisions described in the text?",
      "كيف يؤثر \"{term}\" في قرارات الأعمال الموصوفة في النص؟",
    ),
    Domain::General => Localized::new(
      "What does the text say about \"{term}\"?",
      "ماذا يقول النص عن \"{term}\"؟",
    ),
  }
}

pub const DIRECT_CORRECT_FALLBACK: Localized = Localized::new(
  "\"{term}\" is a central term of this {topic} text.",
  "\"{term}\" مصطلح محوري في هذا النص عن {topic}.",
);
pub const DIRECT_EXPLANATION: Localized = Localized::new(
  "Review the passages of the text that mention \"{term}\".",
  "راجع مواضع النص التي تذكر \"{term}\".",
);
pub const SUMMARY_QUESTION: Localized = Localized::new(
  "Summarize the main idea of the text in your own words.",
  "لخص الفكرة الرئيسية للنص بأسلوبك الخاص.",
);
pub const SUMMARY_EXPLANATION: Localized = Localized::new(
  "A good answer restates the central message without copying sentences.",
  "الإجابة الجيدة تعيد صياغة الرسالة المحورية دون نسخ الجمل.",
);
