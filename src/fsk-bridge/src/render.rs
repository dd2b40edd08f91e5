//! Render target and renderer.
//!
//! Each consumed navigation response replaces the render target's content
//! wholesale. Once the new content has loaded, a fresh [`Interceptor`] is
//! attached to it, so links and outbound calls inside the new document flow
//! back into the bridge. Interceptors are per render cycle; nothing global is
//! patched.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

use crate::bridge::BridgeCore;
use crate::intercept::{ClickDisposition, ClickEvent, FetchInit, FetchRejection, FetchResponse, Interceptor};

/// Callback run once replaced content has loaded.
pub type ReadyCallback = Box<dyn FnOnce() + Send + 'static>;

/// The surface that shows the runtime's documents.
pub trait RenderTarget: Send + Sync {
    /// Replace the whole content.
    fn replace(&self, content: &str);

    /// Run `callback` once the content from the last `replace` has loaded.
    fn on_ready(&self, callback: ReadyCallback);

    /// Route the loaded content's clicks and outbound calls through `interceptor`.
    fn attach(&self, interceptor: Arc<Interceptor>);
}

/// Drives a [`RenderTarget`] for the bridge.
pub struct Renderer {
    target: Arc<dyn RenderTarget>,
    generation: AtomicU64,
}

impl Renderer {
    pub fn new(target: Arc<dyn RenderTarget>) -> Self {
        Self {
            target,
            generation: AtomicU64::new(0),
        }
    }

    /// Number of render cycles so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn target(&self) -> &Arc<dyn RenderTarget> {
        &self.target
    }

    pub(crate) fn render(&self, content: &str, core: Weak<BridgeCore>) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.target.replace(content);

        let target = Arc::downgrade(&self.target);
        self.target.on_ready(Box::new(move || {
            let Some(target) = target.upgrade() else {
                return;
            };
            target.attach(Arc::new(Interceptor::new(core, generation)));
            debug!(generation, "Render target loaded, interceptors attached");
        }));
    }
}

#[derive(Default)]
struct Surface {
    content: Option<String>,
    interceptor: Option<Arc<Interceptor>>,
    pending_ready: Vec<ReadyCallback>,
}

/// In-memory render target.
///
/// Records the current document and the interceptor attached to it, and
/// plays the role of the page: [`click`](Self::click) and
/// [`fetch`](Self::fetch) dispatch to whatever interceptor the last render
/// cycle attached.
pub struct MemoryRenderTarget {
    surface: Mutex<Surface>,
    deferred: bool,
    renders: watch::Sender<u64>,
}

impl MemoryRenderTarget {
    /// A target whose content loads as soon as it is replaced.
    pub fn new() -> Self {
        Self::build(false)
    }

    /// A target that holds `on_ready` callbacks until [`finish_load`](Self::finish_load).
    pub fn deferred() -> Self {
        Self::build(true)
    }

    fn build(deferred: bool) -> Self {
        let (renders, _) = watch::channel(0);
        Self {
            surface: Mutex::new(Surface::default()),
            deferred,
            renders,
        }
    }

    /// Current document, if anything has rendered.
    pub fn content(&self) -> Option<String> {
        self.surface.lock().content.clone()
    }

    /// Number of times the content was replaced.
    pub fn renders(&self) -> u64 {
        *self.renders.borrow()
    }

    /// Wait until at least `count` replacements have happened.
    pub async fn wait_for_renders(&self, count: u64) {
        let mut rx = self.renders.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|n| *n >= count).await;
    }

    /// Interceptor attached to the current content.
    pub fn interceptor(&self) -> Option<Arc<Interceptor>> {
        self.surface.lock().interceptor.clone()
    }

    /// Fire pending `on_ready` callbacks.
    pub fn finish_load(&self) {
        let pending = std::mem::take(&mut self.surface.lock().pending_ready);
        for callback in pending {
            callback();
        }
    }

    /// Simulate a click inside the current content.
    pub fn click(&self, event: &ClickEvent) -> ClickDisposition {
        match self.interceptor() {
            Some(interceptor) => interceptor.on_click(event),
            None => ClickDisposition::Default,
        }
    }

    /// Simulate an outbound call from the current content.
    pub async fn fetch(&self, url: &str, init: FetchInit) -> Result<FetchResponse, FetchRejection> {
        let Some(interceptor) = self.interceptor() else {
            return Err(FetchRejection::new("Content not loaded"));
        };
        interceptor.fetch(url, init).await
    }
}

impl Default for MemoryRenderTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderTarget for MemoryRenderTarget {
    fn replace(&self, content: &str) {
        {
            let mut surface = self.surface.lock();
            surface.content = Some(content.to_string());
            // Listeners belonged to the old document
            surface.interceptor = None;
        }
        self.renders.send_modify(|n| *n += 1);
    }

    fn on_ready(&self, callback: ReadyCallback) {
        if self.deferred {
            self.surface.lock().pending_ready.push(callback);
        } else {
            callback();
        }
    }

    fn attach(&self, interceptor: Arc<Interceptor>) {
        self.surface.lock().interceptor = Some(interceptor);
    }
}

impl std::fmt::Debug for MemoryRenderTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRenderTarget")
            .field("renders", &self.renders())
            .field("deferred", &self.deferred)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_drops_interceptor() {
        let target = Arc::new(MemoryRenderTarget::new());
        let renderer = Renderer::new(target.clone());

        renderer.render("<p>one</p>", Weak::new());
        assert_eq!(target.content().as_deref(), Some("<p>one</p>"));
        assert_eq!(target.interceptor().map(|i| i.generation()), Some(1));

        renderer.render("<p>two</p>", Weak::new());
        assert_eq!(target.renders(), 2);
        assert_eq!(renderer.generation(), 2);
        assert_eq!(target.interceptor().map(|i| i.generation()), Some(2));
    }

    #[test]
    fn test_deferred_load() {
        let target = Arc::new(MemoryRenderTarget::deferred());
        let renderer = Renderer::new(target.clone());

        renderer.render("<p>loading</p>", Weak::new());
        assert_eq!(target.content().as_deref(), Some("<p>loading</p>"));
        assert!(target.interceptor().is_none());

        target.finish_load();
        assert_eq!(target.interceptor().map(|i| i.generation()), Some(1));
    }

    #[test]
    fn test_click_without_interceptor_is_default() {
        let target = MemoryRenderTarget::new();
        assert_eq!(
            target.click(&ClickEvent::on(crate::Node::anchor("/about"))),
            ClickDisposition::Default
        );
    }
}
