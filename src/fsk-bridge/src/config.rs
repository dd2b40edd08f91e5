//! Bridge configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::defaults;
use crate::{BridgeError, Result};

/// One entry of the interception table as written in config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Method filter: `*` for any, otherwise a verb such as `POST`.
    #[serde(default = "default_any_method")]
    pub method: String,

    /// Route pattern: exact path, `/prefix/*`, `/prefix/**` or `*`.
    pub route: String,
}

impl RouteConfig {
    pub fn new(method: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            route: route.into(),
        }
    }
}

fn default_any_method() -> String {
    "*".to_string()
}

/// Configuration for the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Name of the Request Artifact.
    #[serde(default = "default_request_artifact")]
    pub request_artifact: String,

    /// Name of the Response Artifact.
    #[serde(default = "default_response_artifact")]
    pub response_artifact: String,

    /// Navigation poller interval in milliseconds.
    #[serde(default = "default_nav_poll_ms")]
    pub nav_poll_interval_ms: u64,

    /// API-call poller interval in milliseconds.
    #[serde(default = "default_api_poll_ms")]
    pub api_poll_interval_ms: u64,

    /// Responses shorter than this are logged as a possible error.
    #[serde(default = "default_short_content_threshold")]
    pub short_content_threshold: usize,

    /// Characters of each response shown in the debug preview.
    #[serde(default = "default_preview_len")]
    pub preview_len: usize,

    /// Link destinations with this prefix are kept inside the bridge.
    #[serde(default = "default_site_root_prefix")]
    pub site_root_prefix: String,

    /// Outbound calls routed into the bridge.
    #[serde(default = "default_routes")]
    pub routes: Vec<RouteConfig>,

    /// Reason string for rejected outbound calls.
    #[serde(default = "default_rejection_reason")]
    pub rejection_reason: String,
}

fn default_request_artifact() -> String {
    defaults::REQUEST_ARTIFACT.to_string()
}

fn default_response_artifact() -> String {
    defaults::RESPONSE_ARTIFACT.to_string()
}

fn default_nav_poll_ms() -> u64 {
    defaults::NAV_POLL_INTERVAL_MS
}

fn default_api_poll_ms() -> u64 {
    defaults::API_POLL_INTERVAL_MS
}

fn default_short_content_threshold() -> usize {
    defaults::SHORT_CONTENT_THRESHOLD
}

fn default_preview_len() -> usize {
    defaults::PREVIEW_LEN
}

fn default_site_root_prefix() -> String {
    defaults::SITE_ROOT_PREFIX.to_string()
}

fn default_routes() -> Vec<RouteConfig> {
    vec![RouteConfig::new("*", defaults::API_ROUTE)]
}

fn default_rejection_reason() -> String {
    defaults::REJECTION_REASON.to_string()
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            request_artifact: default_request_artifact(),
            response_artifact: default_response_artifact(),
            nav_poll_interval_ms: default_nav_poll_ms(),
            api_poll_interval_ms: default_api_poll_ms(),
            short_content_threshold: default_short_content_threshold(),
            preview_len: default_preview_len(),
            site_root_prefix: default_site_root_prefix(),
            routes: default_routes(),
            rejection_reason: default_rejection_reason(),
        }
    }
}

impl BridgeConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for configuration.
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::new()
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), "Bridge config loaded");
        Ok(config)
    }

    /// Apply `FSK_BRIDGE_*` environment overrides.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(v) = lookup("FSK_BRIDGE_REQUEST_ARTIFACT") {
            self.request_artifact = v;
        }
        if let Some(v) = lookup("FSK_BRIDGE_RESPONSE_ARTIFACT") {
            self.response_artifact = v;
        }
        if let Some(v) = lookup("FSK_BRIDGE_NAV_POLL_MS") {
            self.nav_poll_interval_ms = parse_number("FSK_BRIDGE_NAV_POLL_MS", &v)?;
        }
        if let Some(v) = lookup("FSK_BRIDGE_API_POLL_MS") {
            self.api_poll_interval_ms = parse_number("FSK_BRIDGE_API_POLL_MS", &v)?;
        }
        if let Some(v) = lookup("FSK_BRIDGE_SHORT_CONTENT_THRESHOLD") {
            self.short_content_threshold = parse_number("FSK_BRIDGE_SHORT_CONTENT_THRESHOLD", &v)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check the config for values the bridge cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.request_artifact.is_empty() || self.response_artifact.is_empty() {
            return Err(BridgeError::Config(
                "artifact names must not be empty".to_string(),
            ));
        }
        if self.request_artifact == self.response_artifact {
            return Err(BridgeError::Config(format!(
                "request and response artifacts are both '{}'",
                self.request_artifact
            )));
        }
        if self.nav_poll_interval_ms == 0 || self.api_poll_interval_ms == 0 {
            return Err(BridgeError::Config(
                "poll intervals must be at least 1 ms".to_string(),
            ));
        }
        if self.site_root_prefix.is_empty() {
            return Err(BridgeError::Config(
                "site_root_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn nav_poll_interval(&self) -> Duration {
        Duration::from_millis(self.nav_poll_interval_ms)
    }

    pub fn api_poll_interval(&self) -> Duration {
        Duration::from_millis(self.api_poll_interval_ms)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| BridgeError::Config(format!("{key} must be a number, got '{value}'")))
}

/// Builder for BridgeConfig.
#[derive(Debug, Default)]
pub struct BridgeConfigBuilder {
    config: BridgeConfig,
}

impl BridgeConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: BridgeConfig::new(),
        }
    }

    pub fn request_artifact(mut self, name: impl Into<String>) -> Self {
        self.config.request_artifact = name.into();
        self
    }

    pub fn response_artifact(mut self, name: impl Into<String>) -> Self {
        self.config.response_artifact = name.into();
        self
    }

    pub fn nav_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.nav_poll_interval_ms = ms;
        self
    }

    pub fn api_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.api_poll_interval_ms = ms;
        self
    }

    pub fn short_content_threshold(mut self, chars: usize) -> Self {
        self.config.short_content_threshold = chars;
        self
    }

    pub fn site_root_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.site_root_prefix = prefix.into();
        self
    }

    /// Drop all routes, including the default API route.
    pub fn clear_routes(mut self) -> Self {
        self.config.routes.clear();
        self
    }

    /// Add a forwarded route.
    pub fn route(mut self, method: impl Into<String>, route: impl Into<String>) -> Self {
        self.config.routes.push(RouteConfig::new(method, route));
        self
    }

    pub fn rejection_reason(mut self, reason: impl Into<String>) -> Self {
        self.config.rejection_reason = reason.into();
        self
    }

    /// Build the config.
    pub fn build(self) -> BridgeConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.request_artifact, "request.tmp");
        assert_eq!(config.response_artifact, "response.tmp");
        assert_eq!(config.nav_poll_interval(), Duration::from_millis(100));
        assert_eq!(config.api_poll_interval(), Duration::from_millis(50));
        assert_eq!(config.short_content_threshold, 50);
        assert_eq!(config.routes, vec![RouteConfig::new("*", "/api/run")]);
        assert_eq!(config.rejection_reason, "Fetch intercepted");
        config.validate().unwrap();
    }

    #[test]
    fn test_config_builder() {
        let config = BridgeConfig::builder()
            .nav_poll_interval_ms(20)
            .clear_routes()
            .route("POST", "/api/**")
            .route("*", "/rpc")
            .build();

        assert_eq!(config.nav_poll_interval_ms, 20);
        assert_eq!(config.routes.len(), 2);
        assert_eq!(config.routes[0].method, "POST");
    }

    #[test]
    fn test_from_toml_partial() {
        let config = BridgeConfig::from_toml_str(
            r#"
            api_poll_interval_ms = 10

            [[routes]]
            route = "/api/eval"
            "#,
        )
        .unwrap();

        assert_eq!(config.api_poll_interval_ms, 10);
        assert_eq!(config.nav_poll_interval_ms, 100);
        assert_eq!(config.routes, vec![RouteConfig::new("*", "/api/eval")]);
    }

    #[test]
    fn test_validation() {
        let same = BridgeConfig::builder()
            .request_artifact("x.tmp")
            .response_artifact("x.tmp")
            .build();
        assert!(matches!(same.validate(), Err(BridgeError::Config(_))));

        let zero = BridgeConfig::builder().api_poll_interval_ms(0).build();
        assert!(zero.validate().is_err());

        assert!(BridgeConfig::from_toml_str("nav_poll_interval_ms = 0").is_err());
        assert!(matches!(
            BridgeConfig::from_toml_str("nav_poll_interval_ms = \"fast\""),
            Err(BridgeError::Toml(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("FSK_BRIDGE_NAV_POLL_MS", "250"),
            ("FSK_BRIDGE_RESPONSE_ARTIFACT", "out.tmp"),
        ]);

        let config = BridgeConfig::default()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.nav_poll_interval_ms, 250);
        assert_eq!(config.response_artifact, "out.tmp");
        assert_eq!(config.api_poll_interval_ms, 50);

        let bad = BridgeConfig::default()
            .with_overrides(|key| (key == "FSK_BRIDGE_API_POLL_MS").then(|| "soon".to_string()));
        assert!(matches!(bad, Err(BridgeError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bridge.toml");
        std::fs::write(&path, "short_content_threshold = 5\n").unwrap();

        let config = BridgeConfig::load(&path).unwrap();
        assert_eq!(config.short_content_threshold, 5);

        assert!(matches!(
            BridgeConfig::load(&dir.path().join("missing.toml")),
            Err(BridgeError::Io(_))
        ));
    }
}
