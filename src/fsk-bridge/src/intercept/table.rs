//! Interception table: which outbound calls enter the bridge.

use tracing::info;

use super::route::{MethodFilter, RoutePattern};
use crate::Result;
use crate::config::BridgeConfig;
use crate::request::Method;

/// What to do with a matched call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAction {
    /// Encode as a POST Request Artifact and resolve with the response body.
    Forward,

    /// Reject with this reason.
    Reject(String),
}

#[derive(Debug, Clone)]
struct Entry {
    method: MethodFilter,
    pattern: RoutePattern,
    action: RouteAction,
}

/// Ordered table of route entries. First match wins; no match rejects.
#[derive(Debug, Clone)]
pub struct InterceptionTable {
    entries: Vec<Entry>,
    rejection_reason: String,
}

impl InterceptionTable {
    /// Create an empty table that rejects everything with `rejection_reason`.
    pub fn new(rejection_reason: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            rejection_reason: rejection_reason.into(),
        }
    }

    /// Compile the routes in `config`.
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        let mut table = Self::new(config.rejection_reason.clone());
        for route in &config.routes {
            let method = MethodFilter::parse(&route.method)?;
            let pattern = RoutePattern::parse(&route.route)?;
            info!(method = %method, route = %pattern, "Registered intercepted route");
            table.insert(method, pattern, RouteAction::Forward);
        }
        Ok(table)
    }

    /// Append an entry.
    pub fn insert(&mut self, method: MethodFilter, pattern: RoutePattern, action: RouteAction) {
        self.entries.push(Entry {
            method,
            pattern,
            action,
        });
    }

    /// Decide what happens to a call to `url` with `method`.
    pub fn resolve(&self, method: &Method, url: &str) -> RouteAction {
        self.entries
            .iter()
            .find(|entry| entry.method.allows(method) && entry.pattern.matches(url))
            .map(|entry| entry.action.clone())
            .unwrap_or_else(|| RouteAction::Reject(self.rejection_reason.clone()))
    }

    pub fn rejection_reason(&self) -> &str {
        &self.rejection_reason
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_forwards_only_api_run() {
        let table = InterceptionTable::from_config(&BridgeConfig::default()).unwrap();
        assert_eq!(table.len(), 1);

        assert_eq!(table.resolve(&Method::Post, "/api/run"), RouteAction::Forward);
        // The method does not matter for the default route
        assert_eq!(table.resolve(&Method::Get, "/api/run"), RouteAction::Forward);

        assert_eq!(
            table.resolve(&Method::Post, "/api/other"),
            RouteAction::Reject("Fetch intercepted".to_string())
        );
        assert_eq!(
            table.resolve(&Method::Get, "https://example.com/data.json"),
            RouteAction::Reject("Fetch intercepted".to_string())
        );
    }

    #[test]
    fn test_first_match_wins() {
        let mut table = InterceptionTable::new("nope");
        table.insert(
            MethodFilter::Any,
            RoutePattern::parse("/api/admin/**").unwrap(),
            RouteAction::Reject("admin is off limits".to_string()),
        );
        table.insert(
            MethodFilter::Only(Method::Post),
            RoutePattern::parse("/api/**").unwrap(),
            RouteAction::Forward,
        );

        assert_eq!(
            table.resolve(&Method::Post, "/api/admin/reset"),
            RouteAction::Reject("admin is off limits".to_string())
        );
        assert_eq!(table.resolve(&Method::Post, "/api/run"), RouteAction::Forward);
        assert_eq!(
            table.resolve(&Method::Get, "/api/run"),
            RouteAction::Reject("nope".to_string())
        );
    }

    #[test]
    fn test_invalid_route_in_config() {
        let config = BridgeConfig::builder().route("*", "api/run").build();
        assert!(InterceptionTable::from_config(&config).is_err());
    }
}
