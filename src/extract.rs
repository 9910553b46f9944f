//! Locate and parse the JSON object embedded in a completion.
//!
//! Models wrap JSON in prose or code fences. We slice from the first `{` to
//! the last `}` and parse that span as-is. No repair is attempted: a bad span
//! is an error so the caller falls back.

use serde_json::{Map, Value};

use crate::error::ExtractError;

pub fn extract_structured_payload(raw: &str) -> Result<Map<String, Value>, ExtractError> {
  let text = raw.trim();
  let start = text.find('{').ok_or(ExtractError::NoPayloadFound)?;
  let end = match text.rfind('}') {
    Some(end) if end > start => end,
    // An opening brace with nothing closing it is a broken payload, not a missing one.
    _ => return Err(ExtractError::MalformedPayload("unterminated object".into())),
  };

  match serde_json::from_str::<Value>(&text[start..=end]) {
    Ok(Value::Object(map)) => Ok(map),
    Ok(other) => Err(ExtractError::MalformedPayload(format!("expected object, got {}", type_name(&other)))),
    Err(e) => Err(ExtractError::MalformedPayload(e.to_string())),
  }
}

fn type_name(v: &Value) -> &'static str {
  match v {
    Value::Null => "null",
    Value::Bool(_) => "bool",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}
