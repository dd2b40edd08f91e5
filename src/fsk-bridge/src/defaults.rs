//! Centralized default values for the bridge.
//!
//! Every tunable in [`BridgeConfig`](crate::BridgeConfig) falls back to one of
//! these constants, so the host and the runtime side agree on them without
//! sharing a config file.

/// Name of the Request Artifact written by the host.
pub const REQUEST_ARTIFACT: &str = "request.tmp";

/// Name of the Response Artifact written by the runtime.
pub const RESPONSE_ARTIFACT: &str = "response.tmp";

/// Interval of the navigation response poller in milliseconds.
pub const NAV_POLL_INTERVAL_MS: u64 = 100;

/// Interval of the poller waiting on an in-flight API call in milliseconds.
pub const API_POLL_INTERVAL_MS: u64 = 50;

/// Interval at which the simulated runtime looks for a Request Artifact.
pub const RUNTIME_POLL_INTERVAL_MS: u64 = 100;

/// Responses shorter than this many characters are logged as suspicious.
///
/// Diagnostic only: short content is still delivered.
pub const SHORT_CONTENT_THRESHOLD: usize = 50;

/// Number of characters of a response included in the debug preview.
pub const PREVIEW_LEN: usize = 500;

/// Links whose destination starts with this prefix stay inside the bridge.
pub const SITE_ROOT_PREFIX: &str = "/";

/// The API route forwarded into the bridge out of the box.
pub const API_ROUTE: &str = "/api/run";

/// Reason given when an outbound call is not routed into the bridge.
pub const REJECTION_REASON: &str = "Fetch intercepted";

/// Path used at startup when the address bar has none.
pub const ROOT_PATH: &str = "/";

/// Protocol version written on every request line.
pub const HTTP_VERSION: &str = "HTTP/1.1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::assertions_on_constants)]
    fn test_poll_intervals_are_reasonable() {
        // API waits poll faster than page navigation
        assert!(API_POLL_INTERVAL_MS < NAV_POLL_INTERVAL_MS);
        assert!(NAV_POLL_INTERVAL_MS <= 1000);

        // Preview must cover at least the warning threshold
        assert!(PREVIEW_LEN > SHORT_CONTENT_THRESHOLD);
    }

    #[test]
    fn test_artifact_names_differ() {
        assert_ne!(REQUEST_ARTIFACT, RESPONSE_ARTIFACT);
    }
}
