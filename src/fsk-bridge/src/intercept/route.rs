//! Route and method matching for intercepted calls.

use crate::request::Method;
use crate::{BridgeError, Result};

/// Route pattern for the interception table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePattern {
    /// Match any route ("*").
    Any,

    /// Match a prefix and everything below it ("/api/**").
    Subtree(String),

    /// Match exactly one segment below a prefix ("/api/*").
    Children(String),

    /// Match one literal route ("/api/run").
    Exact(String),
}

impl RoutePattern {
    /// Parse a pattern string.
    pub fn parse(pattern: &str) -> Result<Self> {
        let pattern = pattern.trim();

        if pattern.is_empty() {
            return Err(BridgeError::InvalidPattern("empty pattern".to_string()));
        }

        if pattern == "*" {
            return Ok(RoutePattern::Any);
        }

        if !pattern.starts_with('/') {
            return Err(BridgeError::InvalidPattern(format!(
                "route must start with '/': {pattern}"
            )));
        }

        if let Some(prefix) = pattern.strip_suffix("/**") {
            return Ok(RoutePattern::Subtree(prefix.to_string()));
        }

        if let Some(prefix) = pattern.strip_suffix("/*") {
            return Ok(RoutePattern::Children(prefix.to_string()));
        }

        if pattern.contains('*') {
            return Err(BridgeError::InvalidPattern(format!(
                "wildcards are only allowed as a trailing segment: {pattern}"
            )));
        }

        Ok(RoutePattern::Exact(pattern.to_string()))
    }

    /// Check if this pattern matches a call destination.
    ///
    /// `Exact` compares the whole destination, so a query string or fragment
    /// makes it a different route. The wildcard patterns only look at the
    /// path part.
    pub fn matches(&self, url: &str) -> bool {
        let path = route_of(url);

        match self {
            RoutePattern::Any => true,
            RoutePattern::Exact(route) => url == route,
            RoutePattern::Subtree(prefix) => {
                path == prefix
                    || path
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            RoutePattern::Children(prefix) => path
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .is_some_and(|segment| !segment.is_empty() && !segment.contains('/')),
        }
    }
}

/// The path part of a call destination.
fn route_of(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

impl std::fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutePattern::Any => write!(f, "*"),
            RoutePattern::Subtree(p) => write!(f, "{}/**", p),
            RoutePattern::Children(p) => write!(f, "{}/*", p),
            RoutePattern::Exact(p) => write!(f, "{}", p),
        }
    }
}

impl std::str::FromStr for RoutePattern {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Which methods a table entry applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodFilter {
    Any,
    Only(Method),
}

impl MethodFilter {
    pub fn parse(filter: &str) -> Result<Self> {
        match filter.trim() {
            "*" => Ok(MethodFilter::Any),
            other => Ok(MethodFilter::Only(other.parse()?)),
        }
    }

    pub fn allows(&self, method: &Method) -> bool {
        match self {
            MethodFilter::Any => true,
            MethodFilter::Only(m) => m == method,
        }
    }
}

impl std::fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MethodFilter::Any => write!(f, "*"),
            MethodFilter::Only(m) => write!(f, "{}", m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_parse() {
        assert_eq!(RoutePattern::parse("*").unwrap(), RoutePattern::Any);
        assert_eq!(
            RoutePattern::parse("/api/**").unwrap(),
            RoutePattern::Subtree("/api".to_string())
        );
        assert_eq!(
            RoutePattern::parse("/api/*").unwrap(),
            RoutePattern::Children("/api".to_string())
        );
        assert_eq!(
            RoutePattern::parse(" /api/run ").unwrap(),
            RoutePattern::Exact("/api/run".to_string())
        );

        assert!(RoutePattern::parse("").is_err());
        assert!(RoutePattern::parse("api/run").is_err());
        assert!(RoutePattern::parse("/api/*/run").is_err());
    }

    #[test]
    fn test_pattern_matches() {
        let exact = RoutePattern::Exact("/api/run".to_string());
        assert!(exact.matches("/api/run"));
        assert!(!exact.matches("/api/run?verbose=1"));
        assert!(!exact.matches("/api/run#top"));
        assert!(!exact.matches("/api/run/"));
        assert!(!exact.matches("/api/runner"));
        assert!(!exact.matches("https://example.com/api/run"));

        let subtree = RoutePattern::Subtree("/api".to_string());
        assert!(subtree.matches("/api"));
        assert!(subtree.matches("/api/run"));
        assert!(subtree.matches("/api/v1/run"));
        assert!(subtree.matches("/api/run?x=1"));
        assert!(!subtree.matches("/apiary"));

        let children = RoutePattern::Children("/api".to_string());
        assert!(children.matches("/api/run"));
        assert!(!children.matches("/api"));
        assert!(!children.matches("/api/"));
        assert!(!children.matches("/api/v1/run"));

        assert!(RoutePattern::Any.matches("https://anywhere.example"));
    }

    #[test]
    fn test_display_roundtrips_pattern_text() {
        for text in ["*", "/api/**", "/api/*", "/api/run"] {
            assert_eq!(RoutePattern::parse(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn test_method_filter() {
        assert!(MethodFilter::parse("*").unwrap().allows(&Method::Get));

        let post = MethodFilter::parse("post").unwrap();
        assert!(post.allows(&Method::Post));
        assert!(!post.allows(&Method::Get));
        assert_eq!(post.to_string(), "POST");
    }
}
