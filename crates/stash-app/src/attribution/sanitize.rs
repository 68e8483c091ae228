//! Value sanitization for captured URL parameters.
//!
//! Marketing parameters are user-controllable and end up in analytics
//! payloads, so anything that looks like personal data is dropped before it
//! is stored. Clean values pass through unchanged apart from trimming.

use once_cell::sync::Lazy;
use regex::Regex;

/// Longest value kept, in characters.
pub const MAX_VALUE_CHARS: usize = 256;

const EMAIL_PATTERN: &str = r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}";

const PII_PATTERNS: &[(&str, &str)] = &[
    ("email", EMAIL_PATTERN),
    ("ssn", r"\b\d{3}-\d{2}-\d{4}\b"),
    // Whole-value match with a leading `+` or separators: bare digit runs
    // are common campaign and click ids.
    (
        "phone",
        r"^(?:\+\d[\d\s().-]{6,18}\d|\(?\d{2,4}\)?[\s.-]\d{3,4}[\s.-]\d{3,4})$",
    ),
];

static PII_REGEXES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    PII_PATTERNS
        .iter()
        .filter_map(|(kind, pattern)| Regex::new(pattern).ok().map(|re| (*kind, re)))
        .collect()
});

static EMAIL_REGEX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(&format!("^{EMAIL_PATTERN}$")).ok());

/// Whether the whole of `value` is an email address.
pub fn is_email(value: &str) -> bool {
    EMAIL_REGEX.as_ref().is_some_and(|re| re.is_match(value))
}

/// Kind of personal data `value` looks like, if any.
pub fn detect_pii(value: &str) -> Option<&'static str> {
    PII_REGEXES
        .iter()
        .find(|(_, re)| re.is_match(value))
        .map(|(kind, _)| *kind)
}

/// Trim, drop control characters and cap the length. Returns `None` for
/// empty values and values that look like personal data.
pub fn sanitize_value(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_VALUE_CHARS)
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    if let Some(kind) = detect_pii(&cleaned) {
        tracing::debug!(kind, "dropped attribution value matching personal data");
        return None;
    }
    Some(cleaned)
}

/// Referral codes: sanitized, upper-cased, alphanumerics plus `-` and `_`.
pub fn sanitize_referral_code(raw: &str) -> Option<String> {
    let value = sanitize_value(raw)?;
    let code: String = value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .map(|c| c.to_ascii_uppercase())
        .collect();
    (!code.is_empty()).then_some(code)
}
