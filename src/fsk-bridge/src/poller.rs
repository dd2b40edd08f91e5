//! Fixed-interval response polling.
//!
//! The channel offers no notifications, so both sides poll. The navigation
//! poller never stops on its own; the API poller stops as soon as it has
//! consumed the response it was waiting for.

use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, trace};

use crate::bridge::BridgeCore;
use crate::channel;

/// Handle to a background polling task.
#[derive(Debug)]
pub struct PollerHandle {
    handle: JoinHandle<()>,
}

impl PollerHandle {
    pub(crate) fn spawn<F>(task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(task),
        }
    }

    /// Stop the poller.
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// An interval whose first tick fires one full period from now.
pub(crate) fn ticker(period: Duration) -> Interval {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

pub(crate) fn spawn_navigation_poller(core: Weak<BridgeCore>) -> PollerHandle {
    let Some(period) = core.upgrade().map(|c| c.config.nav_poll_interval()) else {
        return PollerHandle::spawn(async {});
    };

    PollerHandle::spawn(async move {
        debug!(period_ms = period.as_millis() as u64, "Navigation poller started");
        let mut interval = ticker(period);
        loop {
            interval.tick().await;
            let Some(core) = core.upgrade() else {
                debug!("Bridge dropped, navigation poller exiting");
                return;
            };
            core.poll_navigation();
        }
    })
}

/// Poll until the response for an in-flight API call appears.
///
/// Consumes it, releases the guard and returns the raw body.
pub(crate) async fn await_api_response(core: Arc<BridgeCore>) -> String {
    let mut interval = ticker(core.config.api_poll_interval());
    loop {
        interval.tick().await;

        let Some(channel) = core.channel.get() else {
            continue;
        };

        match channel::take(channel.as_ref(), &core.config.response_artifact) {
            Ok(Some(content)) => {
                core.metrics.record_consumed();
                core.guard.release();
                debug!(length = content.chars().count(), "API response received");
                return content;
            }
            Ok(None) => {}
            Err(e) => trace!(error = %e, "API response poll failed, retrying next tick"),
        }
    }
}

/// The first `max_chars` characters of `content`.
pub(crate) fn preview(content: &str, max_chars: usize) -> &str {
    match content.char_indices().nth(max_chars) {
        Some((end, _)) => &content[..end],
        None => content,
    }
}
