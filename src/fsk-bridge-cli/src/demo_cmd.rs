//! `fsk-bridge demo`: a scripted session against an in-process runtime.
//!
//! Startup render, a link click, an intercepted API call, a rejected
//! outbound call and a history step back, all through a memory channel.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Args;
use fsk_bridge::defaults::API_ROUTE;
use fsk_bridge::{
    Bridge, BridgeConfig, ClickDisposition, ClickEvent, FetchInit, MemoryChannel, MemoryHistory,
    MemoryRenderTarget, MetricsSnapshot, Node, RuntimeConsole, ServerLoop,
};
use tracing::info;

use crate::site::DemoSite;

/// Upper bound on any single step of the script.
const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Outbound call the demo expects to be rejected.
const EXTERNAL_URL: &str = "https://example.com/track";

#[derive(Debug, Clone, Args)]
pub struct DemoCli {
    /// Path the simulated host starts on
    #[arg(long, default_value = "/")]
    pub path: String,

    /// Link the script clicks after startup
    #[arg(long, default_value = "/about")]
    pub click: String,

    /// Script posted to the API route
    #[arg(long = "api-body", default_value = "print(1 + 2)")]
    pub api_body: String,
}

/// What the demo observed at each step.
#[derive(Debug, Clone)]
pub struct DemoReport {
    pub startup: String,
    pub click: ClickDisposition,
    pub after_click: Option<String>,
    pub api: Result<String, String>,
    pub rejected: Result<String, String>,
    pub after_back: Option<String>,
    pub metrics: MetricsSnapshot,
}

impl DemoCli {
    pub async fn run(self, config: BridgeConfig) -> Result<()> {
        let report = self.execute(config).await?;
        print_report(&report);
        Ok(())
    }

    /// Run the script and collect what happened.
    pub async fn execute(&self, config: BridgeConfig) -> Result<DemoReport> {
        let console = Arc::new(RuntimeConsole::new());
        let channel = Arc::new(MemoryChannel::new());
        let target = Arc::new(MemoryRenderTarget::new());
        let history = Arc::new(MemoryHistory::new(self.path.clone()));
        let bridge = Bridge::new(config, target.clone(), history.clone())?;

        let server = ServerLoop::new(
            channel.clone(),
            Arc::new(DemoSite::new(console.clone())),
            bridge.config(),
        )
        .spawn();
        console.print("System Ready.");
        let poller = bridge.on_runtime_ready(channel);

        let result = self.script(&bridge, &target, &history).await;

        poller.abort();
        server.abort();
        result
    }

    async fn script(
        &self,
        bridge: &Bridge,
        target: &MemoryRenderTarget,
        history: &MemoryHistory,
    ) -> Result<DemoReport> {
        let mut renders = 1;
        wait_for_render(target, renders).await?;
        let startup = target.content().unwrap_or_default();
        info!(path = %self.path, "Startup page rendered");

        let click = target.click(
            &ClickEvent::on(Node::element("span"))
                .within(Node::anchor(self.click.clone()))
                .within(Node::element("nav")),
        );
        let after_click = match &click {
            ClickDisposition::Intercepted { outcome, .. } if outcome.is_sent() => {
                renders += 1;
                wait_for_render(target, renders).await?;
                target.content()
            }
            _ => None,
        };

        let api = tokio::time::timeout(
            STEP_TIMEOUT,
            target.fetch(API_ROUTE, FetchInit::post(self.api_body.clone())),
        )
        .await
        .context("Timed out waiting for the API response")?
        .map(|response| response.into_text())
        .map_err(|rejection| rejection.to_string());

        let rejected = target
            .fetch(EXTERNAL_URL, FetchInit::get())
            .await
            .map(|response| response.into_text())
            .map_err(|rejection| rejection.to_string());

        let after_back = match history.back() {
            Some(_) if bridge.on_pop_state().is_sent() => {
                renders += 1;
                wait_for_render(target, renders).await?;
                target.content()
            }
            _ => None,
        };

        Ok(DemoReport {
            startup,
            click,
            after_click,
            api,
            rejected,
            after_back,
            metrics: bridge.metrics().snapshot(),
        })
    }
}

async fn wait_for_render(target: &MemoryRenderTarget, count: u64) -> Result<()> {
    if tokio::time::timeout(STEP_TIMEOUT, target.wait_for_renders(count))
        .await
        .is_err()
    {
        bail!("Timed out waiting for render #{count}");
    }
    Ok(())
}

fn print_report(report: &DemoReport) {
    println!("== startup ==\n{}\n", report.startup);

    match &report.click {
        ClickDisposition::Intercepted { path, outcome } => {
            println!("== click {path} ({outcome:?}) ==");
        }
        ClickDisposition::Default => println!("== click (default action) =="),
    }
    if let Some(content) = &report.after_click {
        println!("{content}\n");
    }

    match &report.api {
        Ok(body) => println!("== api ==\n{body}\n"),
        Err(reason) => println!("== api rejected: {reason} ==\n"),
    }
    match &report.rejected {
        Ok(body) => println!("== {EXTERNAL_URL} answered ==\n{body}\n"),
        Err(reason) => println!("== {EXTERNAL_URL} rejected: {reason} ==\n"),
    }

    if let Some(content) = &report.after_back {
        println!("== back ==\n{content}\n");
    }

    let m = &report.metrics;
    println!(
        "requests written: {}, responses consumed: {}, dropped busy: {}, \
         dropped unavailable: {}, write failures: {}, short content: {}, \
         api calls: {}, rejected calls: {}",
        m.requests_written,
        m.responses_consumed,
        m.dropped_busy,
        m.dropped_unavailable,
        m.write_failures,
        m.short_content_warnings,
        m.api_calls_forwarded,
        m.calls_rejected,
    );
}
