//! In-page interception.
//!
//! After every render cycle the content gets an [`Interceptor`] that:
//! - turns clicks on site-local links into bridge navigations, and
//! - routes outbound calls: table matches enter the bridge as POST requests,
//!   everything else is rejected without touching any network.

mod route;
mod table;

pub use route::{MethodFilter, RoutePattern};
pub use table::{InterceptionTable, RouteAction};

use std::sync::Weak;

use thiserror::Error;
use tracing::{debug, info};

use crate::bridge::{BridgeCore, SendOutcome};
use crate::defaults::REJECTION_REASON;
use crate::request::Method;

/// An element on a click's propagation path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub tag: String,
    pub href: Option<String>,
}

impl Node {
    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            href: None,
        }
    }

    pub fn anchor(href: impl Into<String>) -> Self {
        Self {
            tag: "a".to_string(),
            href: Some(href.into()),
        }
    }

    pub fn is_anchor(&self) -> bool {
        self.tag.eq_ignore_ascii_case("a")
    }
}

/// A click, described by its target and the target's ancestors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    /// Target first, then each ancestor up to the root.
    pub path: Vec<Node>,
}

impl ClickEvent {
    /// A click on `target`.
    pub fn on(target: Node) -> Self {
        Self { path: vec![target] }
    }

    /// Add the next ancestor outward.
    pub fn within(mut self, ancestor: Node) -> Self {
        self.path.push(ancestor);
        self
    }

    /// The nearest anchor at or above the target.
    pub fn nearest_anchor(&self) -> Option<&Node> {
        self.path.iter().find(|node| node.is_anchor())
    }
}

/// What happened to a click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickDisposition {
    /// Default navigation suppressed; the path went to the bridge.
    Intercepted { path: String, outcome: SendOutcome },

    /// Not ours; the default action proceeds.
    Default,
}

/// Options of an outbound call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchInit {
    /// Defaults to GET.
    pub method: Option<Method>,
    pub body: Option<String>,
}

impl FetchInit {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: impl Into<String>) -> Self {
        Self {
            method: Some(Method::Post),
            body: Some(body.into()),
        }
    }
}

/// Successful result of an intercepted call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    body: String,
}

impl FetchResponse {
    pub fn new(body: String) -> Self {
        Self { body }
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn into_text(self) -> String {
        self.body
    }
}

/// A rejected outbound call. Carries only a reason string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct FetchRejection(String);

impl FetchRejection {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    pub fn reason(&self) -> &str {
        &self.0
    }
}

/// Click and outbound-call router for one render cycle.
#[derive(Debug)]
pub struct Interceptor {
    core: Weak<BridgeCore>,
    generation: u64,
}

impl Interceptor {
    pub(crate) fn new(core: Weak<BridgeCore>, generation: u64) -> Self {
        Self { core, generation }
    }

    /// Render cycle this interceptor was attached for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Handle a click inside the content.
    ///
    /// History is updated even when the guard drops the navigation.
    pub fn on_click(&self, event: &ClickEvent) -> ClickDisposition {
        let Some(href) = event.nearest_anchor().and_then(|a| a.href.as_deref()) else {
            return ClickDisposition::Default;
        };
        let Some(core) = self.core.upgrade() else {
            return ClickDisposition::Default;
        };
        if !href.starts_with(core.config.site_root_prefix.as_str()) {
            return ClickDisposition::Default;
        }

        core.history.push_state(href);
        let outcome = core.navigate(href);
        debug!(path = href, ?outcome, generation = self.generation, "Link intercepted");

        ClickDisposition::Intercepted {
            path: href.to_string(),
            outcome,
        }
    }

    /// Handle an outbound call from the content.
    pub async fn fetch(&self, url: &str, init: FetchInit) -> Result<FetchResponse, FetchRejection> {
        let Some(core) = self.core.upgrade() else {
            return Err(FetchRejection::new(REJECTION_REASON));
        };
        let method = init.method.clone().unwrap_or(Method::Get);

        match core.table.resolve(&method, url) {
            RouteAction::Forward => {
                info!(url, method = %method, "Forwarding call into bridge");
                let body = init.body.unwrap_or_default();
                core.call_api(url, body).await.map(FetchResponse::new)
            }
            RouteAction::Reject(reason) => {
                debug!(url, method = %method, reason = %reason, "Outbound call rejected");
                core.metrics.record_rejected();
                Err(FetchRejection::new(reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_anchor_walks_up() {
        let event = ClickEvent::on(Node::element("span"))
            .within(Node::element("strong"))
            .within(Node::anchor("/about"))
            .within(Node::anchor("/outer"));

        assert_eq!(
            event.nearest_anchor().and_then(|a| a.href.as_deref()),
            Some("/about")
        );

        let upper = ClickEvent::on(Node {
            tag: "A".to_string(),
            href: Some("/x".to_string()),
        });
        assert!(upper.nearest_anchor().is_some());

        let none = ClickEvent::on(Node::element("button")).within(Node::element("body"));
        assert!(none.nearest_anchor().is_none());
    }

    #[test]
    fn test_detached_interceptor_does_nothing() {
        let interceptor = Interceptor::new(Weak::new(), 0);
        assert_eq!(
            interceptor.on_click(&ClickEvent::on(Node::anchor("/about"))),
            ClickDisposition::Default
        );
    }

    #[test]
    fn test_fetch_init() {
        let init = FetchInit::post("print(1)");
        assert_eq!(init.method, Some(Method::Post));
        assert_eq!(init.body.as_deref(), Some("print(1)"));
        assert_eq!(FetchInit::get().method, None);
    }

    #[test]
    fn test_rejection_is_plain_reason() {
        let rejection = FetchRejection::new("Fetch intercepted");
        assert_eq!(rejection.to_string(), "Fetch intercepted");
        assert_eq!(rejection.reason(), "Fetch intercepted");
    }
}
