//! Board settings
//!
//! Operations that depend on configurable behavior take an explicit
//! [`Settings`] value rather than reading process-wide state, which keeps
//! the core deterministic and easy to test.

use serde::{Deserialize, Serialize};

/// Minimum query length for a fuzzy prefix to count as a match.
pub const DEFAULT_PREFIX_MIN_LEN: usize = 3;

/// How entity names are compared during by-name lookup and duplicate
/// detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMatcher {
    /// Byte equality.
    Exact,
    /// Case-insensitive equality.
    CaseInsensitive,
    /// Case-insensitive equality, or the query is a prefix of the name
    /// with at least `min_len` characters.
    FuzzyPrefix { min_len: usize },
}

impl Default for NameMatcher {
    fn default() -> Self {
        NameMatcher::Exact
    }
}

impl NameMatcher {
    /// The fuzzy-prefix matcher with the default minimum length.
    pub fn fuzzy_prefix() -> Self {
        NameMatcher::FuzzyPrefix {
            min_len: DEFAULT_PREFIX_MIN_LEN,
        }
    }

    /// Whether `query` counts as an exact match for `name`. Exact matches
    /// always outrank fuzzy ones during lookup.
    pub fn is_exact(&self, query: &str, name: &str) -> bool {
        match self {
            NameMatcher::Exact => query == name,
            NameMatcher::CaseInsensitive | NameMatcher::FuzzyPrefix { .. } => {
                query.to_lowercase() == name.to_lowercase()
            }
        }
    }

    /// Whether `query` matches `name` at all under this matcher.
    pub fn is_match(&self, query: &str, name: &str) -> bool {
        if self.is_exact(query, name) {
            return true;
        }
        match self {
            NameMatcher::FuzzyPrefix { min_len } => {
                query.chars().count() >= *min_len
                    && name.to_lowercase().starts_with(&query.to_lowercase())
            }
            _ => false,
        }
    }
}

/// Explicit configuration passed into board operations.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Active matcher for name uniqueness and by-name lookup.
    #[serde(default)]
    pub matcher: NameMatcher,
}

impl Settings {
    pub fn with_matcher(matcher: NameMatcher) -> Self {
        Self { matcher }
    }
}

/// Entity names must contain at least one letter.
pub fn valid_name(name: &str) -> bool {
    name.chars().any(char::is_alphabetic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_matcher_is_case_sensitive() {
        let m = NameMatcher::Exact;
        assert!(m.is_match("Website", "Website"));
        assert!(!m.is_match("website", "Website"));
    }

    #[test]
    fn case_insensitive_matcher() {
        let m = NameMatcher::CaseInsensitive;
        assert!(m.is_match("website", "Website"));
        assert!(!m.is_match("web", "Website"));
    }

    #[test]
    fn fuzzy_prefix_matcher_requires_min_len() {
        let m = NameMatcher::fuzzy_prefix();
        assert!(m.is_match("web", "Website"));
        assert!(m.is_match("WEBS", "website"));
        assert!(!m.is_match("we", "Website"));
        assert!(!m.is_match("site", "Website"));
    }

    #[test]
    fn fuzzy_prefix_distinguishes_exact() {
        let m = NameMatcher::fuzzy_prefix();
        assert!(m.is_exact("website", "Website"));
        assert!(!m.is_exact("web", "Website"));
    }

    #[test]
    fn name_validity_requires_a_letter() {
        assert!(valid_name("Fix the build"));
        assert!(valid_name("a1"));
        assert!(!valid_name("123"));
        assert!(!valid_name("  "));
        assert!(!valid_name("!?"));
    }
}
