//! The runtime's side of the contract.
//!
//! The real runtime is an external collaborator. This module holds what the
//! host needs from it ([`RuntimeConsole`] for its output lines) and an
//! in-process stand-in ([`ServerLoop`]) that honors the same contract: read
//! the Request Artifact, delete it, answer with exactly one Response Artifact.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::Result;
use crate::channel::{self, Channel};
use crate::config::BridgeConfig;
use crate::defaults::RUNTIME_POLL_INTERVAL_MS;
use crate::poller::{PollerHandle, ticker};
use crate::request::Request;

/// Sink for the runtime's line-oriented stdout and stderr.
///
/// Used for diagnostics only. Empty lines are dropped.
#[derive(Debug, Default)]
pub struct RuntimeConsole {
    stdout_lines: AtomicU64,
    stderr_lines: AtomicU64,
}

impl RuntimeConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn print(&self, line: &str) {
        if line.is_empty() {
            return;
        }
        self.stdout_lines.fetch_add(1, Ordering::Relaxed);
        info!(target: "fsk_runtime", "{line}");
    }

    pub fn print_err(&self, line: &str) {
        if line.is_empty() {
            return;
        }
        self.stderr_lines.fetch_add(1, Ordering::Relaxed);
        error!(target: "fsk_runtime", "{line}");
    }

    pub fn stdout_lines(&self) -> u64 {
        self.stdout_lines.load(Ordering::Relaxed)
    }

    pub fn stderr_lines(&self) -> u64 {
        self.stderr_lines.load(Ordering::Relaxed)
    }
}

/// Application logic served by a [`ServerLoop`].
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Produce the response content for `request`.
    ///
    /// Navigation requests expect a full document, API calls a raw body.
    async fn handle(&self, request: Request) -> String;
}

/// Simulated runtime server loop.
pub struct ServerLoop {
    channel: Arc<dyn Channel>,
    handler: Arc<dyn RequestHandler>,
    request_artifact: String,
    response_artifact: String,
    interval: Duration,
}

impl ServerLoop {
    /// Serve `handler` over `channel` using the artifact names in `config`.
    pub fn new(
        channel: Arc<dyn Channel>,
        handler: Arc<dyn RequestHandler>,
        config: &BridgeConfig,
    ) -> Self {
        Self {
            channel,
            handler,
            request_artifact: config.request_artifact.clone(),
            response_artifact: config.response_artifact.clone(),
            interval: Duration::from_millis(RUNTIME_POLL_INTERVAL_MS),
        }
    }

    /// Poll for requests every `interval` instead of the default.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Handle at most one pending request. Returns whether one was served.
    pub async fn serve_once(&self) -> Result<bool> {
        let Some(raw) = channel::take(self.channel.as_ref(), &self.request_artifact)? else {
            return Ok(false);
        };

        let response = match Request::parse(&raw) {
            Ok(request) => {
                debug!(request = %request, "Handling request");
                self.handler.handle(request).await
            }
            Err(e) => {
                warn!(error = %e, "Malformed request artifact");
                format!("400 Bad Request: {e}")
            }
        };

        self.channel.write(&self.response_artifact, &response)?;
        Ok(true)
    }

    /// Run the loop in the background until aborted.
    pub fn spawn(self) -> PollerHandle {
        PollerHandle::spawn(async move {
            info!(
                request_artifact = %self.request_artifact,
                "Server loop started"
            );
            let mut interval = ticker(self.interval);
            loop {
                interval.tick().await;
                if let Err(e) = self.serve_once().await {
                    error!(error = %e, "Server loop tick failed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MemoryChannel;

    struct Echo;

    #[async_trait]
    impl RequestHandler for Echo {
        async fn handle(&self, request: Request) -> String {
            format!("{} {} [{}]", request.method, request.path, request.body)
        }
    }

    fn server(channel: Arc<MemoryChannel>) -> ServerLoop {
        ServerLoop::new(channel, Arc::new(Echo), &BridgeConfig::default())
    }

    #[tokio::test]
    async fn test_serve_once() {
        let channel = Arc::new(MemoryChannel::new());
        let server = server(channel.clone());

        assert!(!server.serve_once().await.unwrap());

        channel
            .write("request.tmp", "POST /api/run HTTP/1.1\r\n\r\nprint(1)")
            .unwrap();
        assert!(server.serve_once().await.unwrap());

        assert!(!channel.exists("request.tmp").unwrap());
        assert_eq!(
            channel.read("response.tmp").unwrap(),
            "POST /api/run [print(1)]"
        );
    }

    #[tokio::test]
    async fn test_malformed_request_still_answered() {
        let channel = Arc::new(MemoryChannel::new());
        let server = server(channel.clone());

        channel.write("request.tmp", "garbage").unwrap();
        assert!(server.serve_once().await.unwrap());
        assert!(
            channel
                .read("response.tmp")
                .unwrap()
                .starts_with("400 Bad Request")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_loop_serves() {
        let channel = Arc::new(MemoryChannel::new());
        let handle = server(channel.clone()).spawn();

        channel
            .write("request.tmp", "GET / HTTP/1.1\r\n\r\n")
            .unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(channel.read("response.tmp").unwrap(), "GET / []");
        handle.abort();
    }

    #[test]
    fn test_console_ignores_empty_lines() {
        let console = RuntimeConsole::new();
        console.print("System Ready.");
        console.print("");
        console.print_err("boom");
        console.print_err("");

        assert_eq!(console.stdout_lines(), 1);
        assert_eq!(console.stderr_lines(), 1);
    }
}
