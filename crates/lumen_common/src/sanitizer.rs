//! Query sanitizer - PII redaction before a query leaves the device.
//!
//! Sensitive topics short-circuit: nothing is sent at all. Otherwise every PII
//! pattern and name phrase is removed until none matches. Sanitizing an
//! already sanitized string is a no-op.

use crate::intent::contains_phrase;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Shortest sanitized query worth sending
pub const MIN_QUERY_LEN: usize = 3;

/// Kinds of personal data the sanitizer recognises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiKind {
    SensitiveTopic,
    Email,
    Phone,
    Ssn,
    CreditCard,
    IpAddress,
    StreetAddress,
    ZipCode,
    Name,
}

impl PiiKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PiiKind::SensitiveTopic => "sensitive_topic",
            PiiKind::Email => "email",
            PiiKind::Phone => "phone",
            PiiKind::Ssn => "ssn",
            PiiKind::CreditCard => "credit_card",
            PiiKind::IpAddress => "ip_address",
            PiiKind::StreetAddress => "street_address",
            PiiKind::ZipCode => "zip_code",
            PiiKind::Name => "name",
        }
    }
}

/// Sanitizer verdict for one query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizationResult {
    pub sanitized_text: String,
    pub contained_pii: bool,
    pub pii_kinds: Vec<PiiKind>,
    pub should_proceed: bool,
}

/// Topics that never leave the device, even redacted
const SENSITIVE_TOPICS: &[&str] = &[
    "password",
    "passwords",
    "passcode",
    "my pin",
    "pin code",
    "social security number",
    "social security",
    "medical",
    "diagnosis",
    "diagnosed",
    "prescription",
    "my medication",
    "home address",
    "where i live",
    "bank account",
    "account number",
    "routing number",
    "credit card number",
];

// Specific shapes first: a card number or SSN must not be half-eaten by the
// phone or zip patterns.
static PII_PATTERNS: LazyLock<Vec<(Regex, PiiKind)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap(),
            PiiKind::Email,
        ),
        (
            Regex::new(r"\b(?:\d{4}[-\s]?){3}\d{4}\b").unwrap(),
            PiiKind::CreditCard,
        ),
        (Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap(), PiiKind::Ssn),
        (
            Regex::new(r"(?:\+?1[-.\s]?)?(?:\(\d{3}\)|\b\d{3})[-.\s]?\d{3}[-.\s]?\d{4}\b").unwrap(),
            PiiKind::Phone,
        ),
        (
            Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").unwrap(),
            PiiKind::IpAddress,
        ),
        (
            Regex::new(
                r"(?i)\b\d{1,5}\s+(?:[a-z0-9.]+\s+){0,3}(?:street|st|avenue|ave|road|rd|boulevard|blvd|lane|ln|drive|dr|court|ct|way|place|pl)\b\.?",
            )
            .unwrap(),
            PiiKind::StreetAddress,
        ),
        (Regex::new(r"\b\d{5}(?:-\d{4})?\b").unwrap(), PiiKind::ZipCode),
    ]
});

// Names are matched case-sensitively so "I'm looking" is left alone
static NAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"\b[Mm]y name is\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?").unwrap(),
        Regex::new(r"\b(?:I'm|I am)\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?\b").unwrap(),
        Regex::new(r"\b[Cc]all me\s+[A-Z][a-z]+\b").unwrap(),
    ]
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([,.;:!?])").unwrap());

/// Redact PII and decide whether the query may be sent.
///
/// Matches are replaced by a space and the pass repeats until the text is
/// stable, so a removal can never glue its neighbours into a new match.
pub fn sanitize(query: &str) -> SanitizationResult {
    let mut text = query.to_string();
    let mut kinds = Vec::new();

    loop {
        if is_sensitive_topic(&text) {
            return SanitizationResult {
                sanitized_text: String::new(),
                contained_pii: true,
                pii_kinds: vec![PiiKind::SensitiveTopic],
                should_proceed: false,
            };
        }

        let before = text.clone();
        for (pattern, kind) in PII_PATTERNS.iter() {
            if pattern.is_match(&text) {
                record(&mut kinds, *kind);
                text = pattern.replace_all(&text, " ").into_owned();
            }
        }
        for pattern in NAME_PATTERNS.iter() {
            if pattern.is_match(&text) {
                record(&mut kinds, PiiKind::Name);
                text = pattern.replace_all(&text, " ").into_owned();
            }
        }
        text = normalize_whitespace(&text);

        if text == before {
            break;
        }
    }

    let should_proceed = text.chars().count() >= MIN_QUERY_LEN;
    SanitizationResult {
        sanitized_text: text,
        contained_pii: !kinds.is_empty(),
        pii_kinds: kinds,
        should_proceed,
    }
}

fn is_sensitive_topic(text: &str) -> bool {
    let lower = text.to_lowercase();
    SENSITIVE_TOPICS.iter().any(|t| contains_phrase(&lower, t))
}

fn record(kinds: &mut Vec<PiiKind>, kind: PiiKind) {
    if !kinds.contains(&kind) {
        kinds.push(kind);
    }
}

fn normalize_whitespace(text: &str) -> String {
    let collapsed = WHITESPACE.replace_all(text, " ");
    let tightened = SPACE_BEFORE_PUNCT.replace_all(&collapsed, "$1");
    tightened
        .trim()
        .trim_start_matches([',', ';'])
        .trim_end_matches([',', ';'])
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitive_topic_short_circuits() {
        let result = sanitize("what is my bank account balance at chase");
        assert_eq!(result.sanitized_text, "");
        assert!(!result.should_proceed);
        assert_eq!(result.pii_kinds, vec![PiiKind::SensitiveTopic]);
    }

    #[test]
    fn test_ssn_scenario() {
        let result = sanitize("my SSN is 123-45-6789, search for Boston news");
        assert!(result.contained_pii);
        assert!(result.pii_kinds.contains(&PiiKind::Ssn));
        assert!(!result.sanitized_text.contains("6789"));
        assert!(result.sanitized_text.contains("search for Boston news"));
        assert!(result.should_proceed);
    }

    #[test]
    fn test_email_redacted() {
        let result = sanitize("send to jane.doe@example.com the latest rust news");
        assert_eq!(result.pii_kinds, vec![PiiKind::Email]);
        assert_eq!(result.sanitized_text, "send to the latest rust news");
    }

    #[test]
    fn test_multiple_kinds_in_one_pass() {
        let result = sanitize(
            "email a@b.io or call 555-123-4567 from 10.0.0.1 near 42 Elm Street 02139 about concerts",
        );
        for kind in [
            PiiKind::Email,
            PiiKind::Phone,
            PiiKind::IpAddress,
            PiiKind::StreetAddress,
            PiiKind::ZipCode,
        ] {
            assert!(result.pii_kinds.contains(&kind), "missing {:?}", kind);
        }
        assert!(!result.sanitized_text.contains("555"));
        assert!(!result.sanitized_text.contains("10.0.0.1"));
        assert!(!result.sanitized_text.contains("Elm"));
        assert!(!result.sanitized_text.contains("02139"));
        assert!(result.sanitized_text.ends_with("about concerts"));
    }

    #[test]
    fn test_credit_card_not_split_into_phone() {
        let result = sanitize("is 4111 1111 1111 1111 valid for online shopping");
        assert_eq!(result.pii_kinds, vec![PiiKind::CreditCard]);
        assert!(!result.sanitized_text.contains("1111"));
    }

    #[test]
    fn test_name_context_redacted() {
        let result = sanitize("My name is Alice Cooper and I want concert dates");
        assert!(result.pii_kinds.contains(&PiiKind::Name));
        assert!(!result.sanitized_text.contains("Alice"));

        let untouched = sanitize("I'm looking for vegan restaurants");
        assert!(!untouched.contained_pii);
        assert_eq!(untouched.sanitized_text, "I'm looking for vegan restaurants");
    }

    #[test]
    fn test_whitespace_normalized() {
        let result = sanitize("  rust    release\tnotes  ");
        assert_eq!(result.sanitized_text, "rust release notes");
        assert!(!result.contained_pii);
    }

    #[test]
    fn test_too_short_does_not_proceed() {
        let result = sanitize("a@b.io hi");
        assert_eq!(result.sanitized_text, "hi");
        assert!(!result.should_proceed);
    }

    #[test]
    fn test_idempotent() {
        for input in [
            "my SSN is 123-45-6789, search for Boston news",
            "call me Bob at 555 123 4567 re: tickets",
            "what is my password",
            "plain query about rust",
            "  ",
        ] {
            let once = sanitize(input);
            let twice = sanitize(&once.sanitized_text);
            assert_eq!(once.sanitized_text, twice.sanitized_text, "input: {}", input);
        }
    }

    #[test]
    fn test_removal_cannot_assemble_an_ssn() {
        let once = sanitize("123-45(555) 123-4567-6789 weather news");
        assert_eq!(once.pii_kinds, vec![PiiKind::Phone]);
        assert_eq!(once.sanitized_text, "123-45 -6789 weather news");

        let twice = sanitize(&once.sanitized_text);
        assert_eq!(twice.sanitized_text, once.sanitized_text);
        assert!(!twice.contained_pii);
    }

    #[test]
    fn test_collapsed_whitespace_is_rescanned() {
        // Dropping the email leaves "555 123 4567" once spaces collapse
        let result = sanitize("555 a@b.io 123 4567 concert tickets");
        assert_eq!(result.pii_kinds, vec![PiiKind::Email, PiiKind::Phone]);
        assert_eq!(result.sanitized_text, "concert tickets");
        assert!(!sanitize(&result.sanitized_text).contained_pii);
    }

    #[test]
    fn test_removal_revealing_sensitive_topic_refuses() {
        let result = sanitize("what is my a@b.io pin for the gym");
        assert_eq!(result.pii_kinds, vec![PiiKind::SensitiveTopic]);
        assert!(!result.should_proceed);
        assert_eq!(result.sanitized_text, "");
    }

    #[test]
    fn test_never_proceeds_when_short() {
        for input in ["", "ab", "x@y.io", "123-45-6789", "  a  "] {
            let result = sanitize(input);
            if result.should_proceed {
                assert!(result.sanitized_text.chars().count() >= MIN_QUERY_LEN);
            }
        }
    }
}
