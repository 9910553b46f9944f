//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::analyzer::TextReport;
use crate::domain::{Content, Language, PipelineResult};
use crate::error::{FailureKind, GatewayErrorKind};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    Analyze {
        text: String,
    },
    Generate {
        content: Content,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Analysis {
        report: TextReport,
    },
    Generated {
        result: PipelineResult,
        notices: Vec<String>,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthOut {
    pub ok: bool,
    pub remote_enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeIn {
    pub text: String,
}

/// Pipeline result plus human-readable notes on any degradation.
#[derive(Debug, Serialize)]
pub struct GenerateOut {
    #[serde(flatten)]
    pub result: PipelineResult,
    pub notices: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub error: String,
}

/// Presentation-layer wording for a fallback reason.
pub fn describe_failure(kind: FailureKind, lang: Language) -> &'static str {
    match (kind, lang) {
        (FailureKind::GatewayDisabled, Language::En) => "Remote generation is not configured; local analysis was used.",
        (FailureKind::GatewayDisabled, Language::Ar) => "التوليد عن بعد غير مفعّل؛ تم استخدام التحليل المحلي.",
        (FailureKind::Remote(GatewayErrorKind::RemoteUnavailable), Language::En) => "The AI service could not be reached.",
        (FailureKind::Remote(GatewayErrorKind::RemoteUnavailable), Language::Ar) => "تعذر الوصول إلى خدمة الذكاء الاصطناعي.",
        (FailureKind::Remote(GatewayErrorKind::RemoteUnauthorized), Language::En) => "The AI service rejected our credentials.",
        (FailureKind::Remote(GatewayErrorKind::RemoteUnauthorized), Language::Ar) => "رفضت خدمة الذكاء الاصطناعي بيانات الاعتماد.",
        (FailureKind::Remote(GatewayErrorKind::RemoteRateLimited), Language::En) => "The AI service is busy (rate limited).",
        (FailureKind::Remote(GatewayErrorKind::RemoteRateLimited), Language::Ar) => "خدمة الذكاء الاصطناعي مشغولة حالياً (تجاوز حد الطلبات).",
        (FailureKind::Remote(GatewayErrorKind::RemoteServerError), Language::En) => "The AI service reported an internal error.",
        (FailureKind::Remote(GatewayErrorKind::RemoteServerError), Language::Ar) => "أبلغت خدمة الذكاء الاصطناعي عن خطأ داخلي.",
        (FailureKind::Remote(GatewayErrorKind::RemoteUnknownError), Language::En) => "The AI service failed unexpectedly.",
        (FailureKind::Remote(GatewayErrorKind::RemoteUnknownError), Language::Ar) => "فشلت خدمة الذكاء الاصطناعي بشكل غير متوقع.",
        (FailureKind::NoPayloadFound | FailureKind::MalformedPayload | FailureKind::ValidationFailed, Language::En) => {
            "The AI response could not be used."
        }
        (FailureKind::NoPayloadFound | FailureKind::MalformedPayload | FailureKind::ValidationFailed, Language::Ar) => {
            "تعذر استخدام رد خدمة الذكاء الاصطناعي."
        }
        (FailureKind::HardFault, Language::En) => "Processing failed; questions were built directly from the text.",
        (FailureKind::HardFault, Language::Ar) => "فشلت المعالجة؛ تم إنشاء الأسئلة مباشرة من النص.",
    }
}

/// One notice per stage that fell back, in stage order.
pub fn notices_for(result: &PipelineResult, lang: Language) -> Vec<String> {
    let prefix = |en: &'static str, ar: &'static str| match lang {
        Language::En => en,
        Language::Ar => ar,
    };
    let mut out = Vec::new();
    if let Some(kind) = result.metadata.understanding_fallback {
        out.push(format!("{} {}", prefix("Understanding:", "الفهم:"), describe_failure(kind, lang)));
    }
    if let Some(kind) = result.metadata.questions_fallback {
        out.push(format!("{} {}", prefix("Questions:", "الأسئلة:"), describe_failure(kind, lang)));
    }
    out
}
