//! Filesystem-mediated request/response bridge for the FSK web host.
//!
//! The FSK runtime runs inside a sandbox with no socket access. The host page
//! and the runtime share nothing but a tiny virtual filesystem, so every page
//! navigation and API call is serialized into a pseudo-HTTP Request Artifact,
//! and the runtime answers with a Response Artifact that the host polls for.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Bridge                             │
//! │  navigate / on_pop_state / call_api                          │
//! │        │                                                     │
//! │        ▼                                                     │
//! │  ┌─────────────┐   try_begin   ┌──────────────┐              │
//! │  │  Request    │──────────────▶│ SingleFlight │◀─── release ─┐│
//! │  │  encoder    │               └──────────────┘              ││
//! │  └─────┬───────┘                                             ││
//! │        │ write request.tmp                                   ││
//! │        ▼                                                     ││
//! │  ┌─────────────┐     (runtime)     ┌──────────────────┐      ││
//! │  │   Channel   │──────────────────▶│  ResponsePoller  │──────┘│
//! │  └─────────────┘  response.tmp     └────────┬─────────┘       │
//! │                                             ▼                 │
//! │                     ┌──────────┐  on_ready  ┌─────────────┐   │
//! │                     │ Renderer │───────────▶│ Interceptor │   │
//! │                     └──────────┘            └─────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fsk_bridge::{Bridge, BridgeConfig, MemoryChannel, MemoryHistory, MemoryRenderTarget};
//!
//! let target = Arc::new(MemoryRenderTarget::new());
//! let history = Arc::new(MemoryHistory::new("/"));
//! let bridge = Bridge::new(BridgeConfig::default(), target.clone(), history)?;
//!
//! // Once the runtime reports ready:
//! let channel = Arc::new(MemoryChannel::new());
//! let poller = bridge.on_runtime_ready(channel.clone());
//! ```

pub mod bridge;
pub mod channel;
pub mod config;
pub mod defaults;
pub mod guard;
pub mod history;
pub mod intercept;
pub mod metrics;
pub mod poller;
pub mod render;
pub mod request;
pub mod runtime;

pub use bridge::{Bridge, SendOutcome};
pub use channel::{Channel, ChannelError, ChannelSlot, DirChannel, MemoryChannel};
pub use config::{BridgeConfig, BridgeConfigBuilder, RouteConfig};
pub use guard::{Flight, GuardState, SingleFlight};
pub use history::{History, MemoryHistory};
pub use intercept::{
    ClickDisposition, ClickEvent, FetchInit, FetchRejection, FetchResponse, InterceptionTable,
    Interceptor, MethodFilter, Node, RouteAction, RoutePattern,
};
pub use metrics::{BridgeMetrics, MetricsSnapshot};
pub use poller::PollerHandle;
pub use render::{MemoryRenderTarget, ReadyCallback, RenderTarget, Renderer};
pub use request::{Method, Request};
pub use runtime::{RequestHandler, RuntimeConsole, ServerLoop};

use thiserror::Error;

/// Errors for the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Invalid route pattern in the interception table.
    #[error("Invalid route pattern: {0}")]
    InvalidPattern(String),

    /// Malformed pseudo-HTTP request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Channel operation failed.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// IO error while loading configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
