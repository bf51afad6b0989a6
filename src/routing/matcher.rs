//! Path pattern matching.
//!
//! # Responsibilities
//! - Decode and normalise request paths into the form patterns are written in
//! - Match a literal pattern against a normalised path
//! - Reject patterns that can never match
//!
//! # Design Decisions
//! - Patterns are written without the leading slash (`""`, `"about/"`)
//! - Matching is exact and case-sensitive, never prefix-based
//! - `""` matches the site root and nothing else

use std::borrow::Cow;
use std::fmt;

use percent_encoding::percent_decode_str;

use crate::routing::RouteError;

/// Percent-decode a request path before it is resolved.
///
/// Paths that do not decode to UTF-8 are returned as received; no pattern
/// contains a `%` escape, so they fall through to a 404.
pub fn decode_path(raw: &str) -> Cow<'_, str> {
    percent_decode_str(raw)
        .decode_utf8()
        .unwrap_or(Cow::Borrowed(raw))
}

/// Strip the single leading `/` from a request path.
///
/// `"/"` becomes `""` and `"/about/"` becomes `"about/"`. Paths without a
/// leading slash are returned unchanged.
pub fn normalize_path(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

/// A literal route pattern such as `""` or `"about/"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutePattern {
    literal: String,
}

impl RoutePattern {
    pub fn new(literal: impl Into<String>) -> Self {
        Self {
            literal: literal.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.literal
    }

    /// Returns true if the normalised path is exactly this pattern.
    pub fn matches(&self, normalized_path: &str) -> bool {
        self.literal == normalized_path
    }

    /// Returns true if a raw request path (with its leading slash) matches.
    pub fn matches_request_path(&self, request_path: &str) -> bool {
        self.matches(normalize_path(request_path))
    }

    /// Absolute URL path for this pattern.
    pub fn to_url(&self) -> String {
        format!("/{}", self.literal)
    }

    /// Structural checks run once when the table is loaded.
    pub fn check(&self) -> Result<(), RouteError> {
        if self.literal.starts_with('/') {
            return Err(RouteError::LeadingSlash {
                pattern: self.literal.clone(),
            });
        }

        if let Some(c) = self
            .literal
            .chars()
            .find(|c| c.is_whitespace() || *c == '?' || *c == '#')
        {
            return Err(RouteError::InvalidPattern {
                pattern: self.literal.clone(),
                reason: format!("contains {c:?}"),
            });
        }

        Ok(())
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.literal)
    }
}

impl From<&str> for RoutePattern {
    fn from(literal: &str) -> Self {
        Self::new(literal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/"), "");
        assert_eq!(normalize_path("/about/"), "about/");
        assert_eq!(normalize_path("about/"), "about/");
        assert_eq!(normalize_path(""), "");
        // Only one slash is stripped.
        assert_eq!(normalize_path("//about/"), "/about/");
    }

    #[test]
    fn test_decode_path() {
        assert_eq!(decode_path("/%61bout/"), "/about/");
        assert_eq!(decode_path("/about/"), "/about/");
        assert!(matches!(decode_path("/about/"), Cow::Borrowed(_)));
        // Not UTF-8 once decoded.
        assert_eq!(decode_path("/%FF/"), "/%FF/");
    }

    #[test]
    fn test_decoded_path_matches() {
        let about = RoutePattern::new("about/");
        assert!(about.matches_request_path(&decode_path("/%61%62out/")));
        assert!(!about.matches_request_path("/%61bout/"));
    }

    #[test]
    fn test_empty_pattern_matches_root_only() {
        let root = RoutePattern::new("");
        assert!(root.matches_request_path("/"));
        assert!(!root.matches_request_path("/about/"));
        assert!(!root.matches_request_path("/anything"));
        assert!(!root.matches_request_path("//"));
    }

    #[test]
    fn test_exact_match_not_prefix() {
        let about = RoutePattern::new("about/");
        assert!(about.matches_request_path("/about/"));
        assert!(!about.matches_request_path("/about"));
        assert!(!about.matches_request_path("/about/team/"));
        assert!(!about.matches_request_path("/ABOUT/")); // Case sensitive
    }

    #[test]
    fn test_to_url() {
        assert_eq!(RoutePattern::new("").to_url(), "/");
        assert_eq!(RoutePattern::new("about/").to_url(), "/about/");
    }

    #[test]
    fn test_check_rejects_leading_slash() {
        let err = RoutePattern::new("/about/").check().unwrap_err();
        assert!(matches!(err, RouteError::LeadingSlash { .. }));
    }

    #[test]
    fn test_check_rejects_query_and_whitespace() {
        assert!(matches!(
            RoutePattern::new("about/?x=1").check(),
            Err(RouteError::InvalidPattern { .. })
        ));
        assert!(matches!(
            RoutePattern::new("about me/").check(),
            Err(RouteError::InvalidPattern { .. })
        ));
        assert!(RoutePattern::new("").check().is_ok());
        assert!(RoutePattern::new("about/").check().is_ok());
    }
}
