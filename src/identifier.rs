//! Identifier classification and validation.
//!
//! User input arrives as a mixed list of raw strings: internal author keys
//! (36-character hyphenated hex) and numeric Scopus author ids. Submit-time
//! classification partitions them into two buckets; the interactive validator
//! gives per-keystroke feedback on Scopus id candidates and is advisory only —
//! the classifier re-derives validity from scratch at submit time.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static AUTHOR_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("valid regex")
});

static SOURCE_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{8,}$").expect("valid regex"));

/// A single classified identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    /// Internal author key (canonical 36-character hyphenated hex form)
    Author(String),
    /// Numeric Scopus author id (at least 8 digits)
    Source(String),
}

impl Identifier {
    /// Classify one raw string.
    ///
    /// Returns `None` for blank or malformed input; malformed entries are
    /// discarded silently rather than reported.
    pub fn parse(raw: &str) -> Option<Identifier> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }
        if AUTHOR_ID_RE.is_match(s) {
            return Some(Identifier::Author(s.to_string()));
        }
        if SOURCE_ID_RE.is_match(s) {
            return Some(Identifier::Source(s.to_string()));
        }
        None
    }
}

/// Classified identifiers, split into disjoint ordered buckets.
///
/// Relative input order is preserved within each bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedIdentifiers {
    /// Internal author keys, in input order
    pub author_ids: Vec<String>,
    /// Scopus author ids, in input order (duplicates kept as entered)
    pub source_ids: Vec<String>,
}

impl ClassifiedIdentifiers {
    /// True when no identifier classified into either bucket.
    pub fn is_empty(&self) -> bool {
        self.author_ids.is_empty() && self.source_ids.is_empty()
    }
}

/// Classify a list of raw identifier strings into the two buckets.
pub fn classify<S: AsRef<str>>(raw: &[S]) -> ClassifiedIdentifiers {
    let mut classified = ClassifiedIdentifiers::default();
    for entry in raw {
        match Identifier::parse(entry.as_ref()) {
            Some(Identifier::Author(id)) => classified.author_ids.push(id),
            Some(Identifier::Source(id)) => classified.source_ids.push(id),
            None => {}
        }
    }
    classified
}

/// Outcome of the interactive Scopus-id check.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SourceIdValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SourceIdValidation {
    fn ok() -> Self {
        SourceIdValidation {
            valid: true,
            reason: None,
        }
    }

    fn fail(reason: &str) -> Self {
        SourceIdValidation {
            valid: false,
            reason: Some(reason.to_string()),
        }
    }
}

/// Validate one candidate Scopus author id.
///
/// Rules are checked in order and the first failure wins:
/// empty, then non-digit characters, then minimum length.
pub fn validate_source_id(raw: &str) -> SourceIdValidation {
    let s = raw.trim();
    if s.is_empty() {
        return SourceIdValidation::fail("must not be empty");
    }
    if !s.chars().all(|c| c.is_ascii_digit()) {
        return SourceIdValidation::fail("only digits allowed");
    }
    if s.len() < 8 {
        return SourceIdValidation::fail("must have at least 8 digits");
    }
    SourceIdValidation::ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTHOR: &str = "11111111-2222-3333-4444-555555555555";

    #[test]
    fn test_parse_author_id() {
        assert_eq!(
            Identifier::parse(AUTHOR),
            Some(Identifier::Author(AUTHOR.to_string()))
        );
    }

    #[test]
    fn test_parse_author_id_is_case_insensitive() {
        let upper = "ABCDEF01-2345-6789-ABCD-EF0123456789";
        assert_eq!(
            Identifier::parse(upper),
            Some(Identifier::Author(upper.to_string()))
        );
    }

    #[test]
    fn test_parse_source_id() {
        assert_eq!(
            Identifier::parse("  57190372620 "),
            Some(Identifier::Source("57190372620".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_short_or_malformed() {
        assert_eq!(Identifier::parse("1234567"), None);
        assert_eq!(Identifier::parse("12 345678"), None);
        assert_eq!(Identifier::parse("abc"), None);
        assert_eq!(Identifier::parse(""), None);
        assert_eq!(Identifier::parse("   "), None);
    }

    #[test]
    fn test_classify_buckets_are_disjoint_and_ordered() {
        let raw = vec![
            "99999999".to_string(),
            AUTHOR.to_string(),
            "bogus".to_string(),
            "12345678".to_string(),
            "".to_string(),
        ];
        let classified = classify(&raw);
        assert_eq!(classified.author_ids, vec![AUTHOR.to_string()]);
        assert_eq!(
            classified.source_ids,
            vec!["99999999".to_string(), "12345678".to_string()]
        );
    }

    #[test]
    fn test_classify_keeps_duplicate_source_ids() {
        let raw = vec!["12345678".to_string(), "12345678".to_string()];
        let classified = classify(&raw);
        assert_eq!(classified.source_ids.len(), 2);
    }

    #[test]
    fn test_classify_all_invalid_is_empty() {
        let classified = classify(&["abc".to_string(), "".to_string()]);
        assert!(classified.is_empty());
    }

    #[test]
    fn test_validate_empty() {
        let v = validate_source_id("   ");
        assert!(!v.valid);
        assert_eq!(v.reason.as_deref(), Some("must not be empty"));
    }

    #[test]
    fn test_validate_non_digit_wins_over_length() {
        // "ab" is both short and non-numeric; the digit rule is checked first
        let v = validate_source_id("ab");
        assert_eq!(v.reason.as_deref(), Some("only digits allowed"));
    }

    #[test]
    fn test_validate_too_short() {
        let v = validate_source_id("1234567");
        assert_eq!(v.reason.as_deref(), Some("must have at least 8 digits"));
    }

    #[test]
    fn test_validate_accepts_eight_or_more_digits() {
        assert!(validate_source_id("12345678").valid);
        assert!(validate_source_id("123456789012345").valid);
    }
}
