//! Only/exclude URL filters applied during curation.
//!
//! Patterns are compiled once when the run configuration is built and matched
//! case-insensitively against a capture's original URL.

use regex::{Regex, RegexBuilder};

use crate::config::ConfigError;

/// A single configured filter: either absent or a compiled pattern.
#[derive(Debug, Clone, Default)]
pub enum UrlFilter {
    /// No filter configured.
    #[default]
    None,
    /// Case-insensitive regular expression.
    Pattern(Regex),
}

impl UrlFilter {
    /// Compiles `pattern`; an empty pattern yields [`UrlFilter::None`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidFilter`] if the pattern does not compile.
    pub fn compile(kind: &'static str, pattern: Option<&str>) -> Result<Self, ConfigError> {
        let Some(pattern) = pattern.filter(|p| !p.is_empty()) else {
            return Ok(Self::None);
        };
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map(Self::Pattern)
            .map_err(|source| ConfigError::InvalidFilter {
                kind,
                pattern: pattern.to_string(),
                source,
            })
    }

    /// `None` if unset, otherwise whether the pattern matches `url`.
    fn test(&self, url: &str) -> Option<bool> {
        match self {
            Self::None => None,
            Self::Pattern(regex) => Some(regex.is_match(url)),
        }
    }
}

/// The pair of filters deciding which captures are eligible.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    only: UrlFilter,
    exclude: UrlFilter,
}

impl FilterSet {
    /// Compiles both filters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidFilter`] naming whichever pattern is malformed.
    pub fn new(only: Option<&str>, exclude: Option<&str>) -> Result<Self, ConfigError> {
        Ok(Self {
            only: UrlFilter::compile("only", only)?,
            exclude: UrlFilter::compile("exclude", exclude)?,
        })
    }

    /// True when no only-filter is set, or the URL matches it.
    #[must_use]
    pub fn matches_only(&self, url: &str) -> bool {
        self.only.test(url).unwrap_or(true)
    }

    /// False when no exclude-filter is set, else whether the URL matches it.
    #[must_use]
    pub fn matches_exclude(&self, url: &str) -> bool {
        self.exclude.test(url).unwrap_or(false)
    }

    /// A URL is eligible iff it passes the only-filter and misses the exclude-filter.
    #[must_use]
    pub fn is_eligible(&self, url: &str) -> bool {
        self.matches_only(url) && !self.matches_exclude(url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_filters_accept_everything() {
        let filters = FilterSet::default();
        assert!(filters.matches_only("http://example.com/a.css"));
        assert!(!filters.matches_exclude("http://example.com/a.css"));
        assert!(filters.is_eligible("http://example.com/a.css"));
    }

    #[test]
    fn test_empty_pattern_is_unset() {
        let filters = FilterSet::new(Some(""), Some("")).unwrap();
        assert!(filters.matches_only("http://example.com/a.css"));
        assert!(!filters.matches_exclude("http://example.com/a.css"));
        assert!(filters.is_eligible(""));
    }

    #[test]
    fn test_only_filter_is_case_insensitive() {
        let filters = FilterSet::new(Some(r"\.html$"), None).unwrap();
        assert!(filters.matches_only("http://example.com/a.html"));
        assert!(filters.matches_only("http://example.com/A.HTML"));
        assert!(!filters.matches_only("http://example.com/a.css"));
    }

    #[test]
    fn test_exclude_filter_wins_over_only() {
        let filters = FilterSet::new(Some("example"), Some("/private/")).unwrap();
        assert!(filters.is_eligible("http://example.com/public/a.html"));
        assert!(!filters.is_eligible("http://example.com/PRIVATE/a.html"));
    }

    #[test]
    fn test_malformed_pattern_names_filter() {
        let err = FilterSet::new(None, Some("(")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("exclude"), "Expected filter kind in: {msg}");
        assert!(msg.contains('('), "Expected pattern in: {msg}");
    }
}
