//! The bridge: request encoding, single flight, and response delivery.

use std::sync::{Arc, Weak};

use tracing::{debug, error, info, warn};

use crate::Result;
use crate::channel::{self, Channel, ChannelSlot};
use crate::config::BridgeConfig;
use crate::guard::{Flight, GuardState, SingleFlight};
use crate::history::{History, startup_path};
use crate::intercept::{FetchRejection, InterceptionTable, Interceptor};
use crate::metrics::BridgeMetrics;
use crate::poller::{self, PollerHandle};
use crate::render::{RenderTarget, Renderer};
use crate::request::Request;

/// Result of trying to put a request on the channel.
///
/// Every outcome other than `Sent` is terminal for the attempt: nothing is
/// queued and nothing is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The Request Artifact was written and the guard is held.
    Sent,

    /// Another request is outstanding; this one was dropped.
    Busy,

    /// The runtime is not ready yet; the request was dropped.
    ChannelUnavailable,

    /// The channel write failed; the guard was released.
    WriteFailed,

    /// The path was empty.
    InvalidPath,
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent)
    }
}

/// Shared state behind [`Bridge`] and every [`Interceptor`].
pub(crate) struct BridgeCore {
    pub(crate) config: BridgeConfig,
    pub(crate) table: InterceptionTable,
    pub(crate) channel: ChannelSlot,
    pub(crate) guard: SingleFlight,
    pub(crate) history: Arc<dyn History>,
    pub(crate) renderer: Renderer,
    pub(crate) metrics: Arc<BridgeMetrics>,
    me: Weak<BridgeCore>,
}

impl BridgeCore {
    /// Encode `request` onto the channel under the single-flight guard.
    pub(crate) fn send(&self, request: &Request, flight: Flight) -> SendOutcome {
        let Some(channel) = self.channel.get() else {
            debug!(request = %request, "Runtime not ready, dropping request");
            self.metrics.record_dropped_unavailable();
            return SendOutcome::ChannelUnavailable;
        };

        if !self.guard.try_begin(flight) {
            debug!(request = %request, "Request already in flight, dropping");
            self.metrics.record_dropped_busy();
            return SendOutcome::Busy;
        }

        match channel.write(&self.config.request_artifact, &request.encode()) {
            Ok(()) => {
                info!(request = %request, "Request sent");
                self.metrics.record_written();
                SendOutcome::Sent
            }
            Err(e) => {
                error!(request = %request, error = %e, "Request write failed");
                self.guard.release();
                self.metrics.record_write_failure();
                SendOutcome::WriteFailed
            }
        }
    }

    pub(crate) fn navigate(&self, path: &str) -> SendOutcome {
        match Request::get(path) {
            Ok(request) => {
                debug!(path, "Navigating");
                self.send(&request, Flight::Navigation)
            }
            Err(e) => {
                warn!(error = %e, "Ignoring navigation");
                SendOutcome::InvalidPath
            }
        }
    }

    /// Write a POST for `path` and wait for its response.
    ///
    /// The wait runs as its own task, so dropping the returned future does
    /// not abandon the guard: the response is still consumed when it lands.
    pub(crate) async fn call_api(
        self: &Arc<Self>,
        path: &str,
        body: String,
    ) -> std::result::Result<String, FetchRejection> {
        let request = Request::post(path, body).map_err(|e| FetchRejection::new(e.to_string()))?;

        match self.send(&request, Flight::Api) {
            SendOutcome::Sent => {}
            SendOutcome::Busy => return Err(FetchRejection::new("Request already in flight")),
            SendOutcome::ChannelUnavailable => {
                return Err(FetchRejection::new("Runtime not ready"));
            }
            SendOutcome::WriteFailed | SendOutcome::InvalidPath => {
                return Err(FetchRejection::new("Request write failed"));
            }
        }
        self.metrics.record_forwarded();

        tokio::spawn(poller::await_api_response(Arc::clone(self)))
            .await
            .map_err(|e| FetchRejection::new(format!("API wait aborted: {e}")))
    }

    /// One navigation poll tick. Returns whether a response was delivered.
    pub(crate) fn poll_navigation(&self) -> bool {
        let Some(channel) = self.channel.get() else {
            return false;
        };

        // An API call owns the next response; its own poller takes it.
        if self.guard.state() == GuardState::AwaitingResponse(Flight::Api) {
            return false;
        }

        match channel::take(channel.as_ref(), &self.config.response_artifact) {
            Ok(Some(content)) => {
                self.deliver(&content);
                true
            }
            Ok(None) => false,
            Err(e) => {
                debug!(error = %e, "Response poll failed, retrying next tick");
                false
            }
        }
    }

    fn deliver(&self, content: &str) {
        self.metrics.record_consumed();

        let length = content.chars().count();
        info!(length, "Response received");
        debug!(
            preview = %poller::preview(content, self.config.preview_len),
            "Response preview"
        );

        if length < self.config.short_content_threshold {
            warn!(
                length,
                threshold = self.config.short_content_threshold,
                "Response content too short, possible error"
            );
            self.metrics.record_short_content();
        }

        self.renderer.render(content, self.me.clone());
        self.guard.release();
    }
}

/// Host-side end of the filesystem bridge.
///
/// Cheap to clone; clones share the same channel, guard and render target.
#[derive(Clone)]
pub struct Bridge {
    core: Arc<BridgeCore>,
}

impl Bridge {
    /// Create a bridge rendering into `target` and tracking `history`.
    ///
    /// The channel starts out unavailable; see [`on_runtime_ready`](Self::on_runtime_ready).
    pub fn new(
        config: BridgeConfig,
        target: Arc<dyn RenderTarget>,
        history: Arc<dyn History>,
    ) -> Result<Self> {
        config.validate()?;
        let table = InterceptionTable::from_config(&config)?;

        let core = Arc::new_cyclic(|me| BridgeCore {
            config,
            table,
            channel: ChannelSlot::new(),
            guard: SingleFlight::new(),
            history,
            renderer: Renderer::new(target),
            metrics: Arc::new(BridgeMetrics::new()),
            me: me.clone(),
        });

        Ok(Self { core })
    }

    /// Make the channel available without sending anything.
    pub fn attach_channel(&self, channel: Arc<dyn Channel>) {
        self.core.channel.attach(channel);
    }

    /// The runtime finished initializing: attach its channel, request the
    /// startup page and start the navigation poller.
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_runtime_ready(&self, channel: Arc<dyn Channel>) -> PollerHandle {
        info!("Runtime ready");
        self.attach_channel(channel);

        let path = startup_path(self.core.history.as_ref());
        self.navigate(&path);

        self.spawn_poller()
    }

    /// Request the page at `path`.
    pub fn navigate(&self, path: &str) -> SendOutcome {
        self.core.navigate(path)
    }

    /// Send `body` to the API route `path` and wait for the raw response.
    pub async fn call_api(
        &self,
        path: &str,
        body: impl Into<String>,
    ) -> std::result::Result<String, FetchRejection> {
        self.core.call_api(path, body.into()).await
    }

    /// The host moved through history: request the now-current path.
    pub fn on_pop_state(&self) -> SendOutcome {
        let path = self.core.history.current_path();
        debug!(path = %path, "History navigation");
        self.navigate(&path)
    }

    /// Run one navigation poll tick by hand.
    pub fn poll_once(&self) -> bool {
        self.core.poll_navigation()
    }

    /// Start the navigation poller. It runs until the handle is aborted or
    /// every `Bridge` clone is dropped.
    pub fn spawn_poller(&self) -> PollerHandle {
        poller::spawn_navigation_poller(Arc::downgrade(&self.core))
    }

    /// An interceptor bound to the latest render cycle.
    ///
    /// Hosts that route calls before anything has rendered can use this
    /// instead of waiting for the render target to attach one.
    pub fn interceptor(&self) -> Interceptor {
        Interceptor::new(
            Arc::downgrade(&self.core),
            self.core.renderer.generation(),
        )
    }

    pub fn guard_state(&self) -> GuardState {
        self.core.guard.state()
    }

    pub fn is_channel_available(&self) -> bool {
        self.core.channel.is_available()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.core.config
    }

    pub fn metrics(&self) -> &Arc<BridgeMetrics> {
        &self.core.metrics
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("guard", &self.core.guard.state())
            .field("channel", &self.core.channel)
            .field("generation", &self.core.renderer.generation())
            .finish()
    }
}
