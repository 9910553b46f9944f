//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// True if the char lies in the Arabic blocks (base, supplement, presentation forms).
pub fn is_arabic(ch: char) -> bool {
  ('\u{0600}'..='\u{06FF}').contains(&ch)
    || ('\u{0750}'..='\u{077F}').contains(&ch)
    || ('\u{08A0}'..='\u{08FF}').contains(&ch)
    || ('\u{FB50}'..='\u{FDFF}').contains(&ch)
    || ('\u{FE70}'..='\u{FEFF}').contains(&ch)
}

/// True for Latin letters, including accented Latin-1/Extended-A forms.
pub fn is_latin(ch: char) -> bool {
  ch.is_ascii_alphabetic() || (('\u{00C0}'..='\u{024F}').contains(&ch) && ch.is_alphabetic())
}

/// Truncate to at most `max` characters (not bytes), appending an ellipsis when cut.
pub fn truncate_chars(s: &str, max: usize) -> String {
  let s = s.trim();
  if s.chars().count() <= max {
    return s.to_string();
  }
  let cut: String = s.chars().take(max).collect();
  format!("{}…", cut.trim_end())
}

/// Non-overlapping occurrence count of `needle` in `haystack`.
pub fn count_occurrences(haystack: &str, needle: &str) -> usize {
  if needle.is_empty() { 0 } else { haystack.matches(needle).count() }
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  let total = s.len();
  if s.chars().count() <= max {
    s.to_string()
  } else {
    format!("{}… ({} bytes total)", s.chars().take(max).collect::<String>(), total)
  }
}
