//! `fsk-bridge attach`: drive a runtime through a shared directory.
//!
//! Rendered documents go to stdout. Commands are read from stdin, one per
//! line, and play the part of the user inside the page.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use clap::Args;
use fsk_bridge::{
    Bridge, BridgeConfig, ClickDisposition, ClickEvent, DirChannel, FetchInit, Interceptor,
    MemoryHistory, Node, ReadyCallback, RenderTarget,
};
use parking_lot::Mutex;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

const HELP: &str = "commands: open <path> | call <url> [body] | back | forward | status | help | quit";

#[derive(Debug, Clone, Args)]
pub struct AttachCli {
    /// Directory shared with the runtime
    #[arg(long, value_name = "DIR")]
    pub dir: PathBuf,

    /// Path the host starts on
    #[arg(long, default_value = "/")]
    pub path: String,
}

/// Render target that prints each document to stdout.
#[derive(Default)]
pub struct StdoutRenderTarget {
    interceptor: Mutex<Option<Arc<Interceptor>>>,
    renders: AtomicU64,
}

impl StdoutRenderTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interceptor(&self) -> Option<Arc<Interceptor>> {
        self.interceptor.lock().clone()
    }
}

impl RenderTarget for StdoutRenderTarget {
    fn replace(&self, content: &str) {
        let n = self.renders.fetch_add(1, Ordering::Relaxed) + 1;
        *self.interceptor.lock() = None;
        println!("----- render #{n} ({} chars) -----", content.chars().count());
        println!("{content}");
    }

    fn on_ready(&self, callback: ReadyCallback) {
        callback();
    }

    fn attach(&self, interceptor: Arc<Interceptor>) {
        *self.interceptor.lock() = Some(interceptor);
    }
}

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Open(String),
    Call { url: String, body: Option<String> },
    Back,
    Forward,
    Status,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word {
            "" => Self::Empty,
            "open" if !rest.is_empty() => Self::Open(rest.to_string()),
            "call" if !rest.is_empty() => {
                let (url, body) = match rest.split_once(char::is_whitespace) {
                    Some((url, body)) => (url, Some(body.trim().to_string())),
                    None => (rest, None),
                };
                Self::Call {
                    url: url.to_string(),
                    body,
                }
            }
            "back" => Self::Back,
            "forward" => Self::Forward,
            "status" => Self::Status,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

impl AttachCli {
    pub async fn run(self, config: BridgeConfig) -> Result<()> {
        let channel = Arc::new(
            DirChannel::new(self.dir.clone())
                .with_context(|| format!("Cannot use {} as the channel", self.dir.display()))?,
        );
        let target = Arc::new(StdoutRenderTarget::new());
        let history = Arc::new(MemoryHistory::new(self.path.clone()));
        let bridge = Bridge::new(config, target.clone(), history.clone())?;

        info!(dir = %self.dir.display(), "Attached to runtime directory");
        let poller = bridge.on_runtime_ready(channel);
        eprintln!("{HELP}");

        let input = BufReader::new(tokio::io::stdin());
        let end = run_session(input, interrupt(), &bridge, &target, &history).await?;

        poller.abort();
        info!(?end, "Detached");
        Ok(())
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Input closed.
    Eof,
    /// The user typed `quit`.
    Quit,
    /// The shutdown signal fired, possibly while a call was still waiting.
    Interrupted,
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Read commands from `input` until it closes, the user quits or `shutdown`
/// resolves. `shutdown` also cuts short a command that is still waiting.
pub async fn run_session<R, S>(
    input: R,
    shutdown: S,
    bridge: &Bridge,
    target: &StdoutRenderTarget,
    history: &MemoryHistory,
) -> Result<SessionEnd>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut lines = input.lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            () = &mut shutdown => return Ok(SessionEnd::Interrupted),
        };
        let Some(line) = line else {
            return Ok(SessionEnd::Eof);
        };

        match ReplCommand::parse(&line) {
            ReplCommand::Quit => return Ok(SessionEnd::Quit),
            command => {
                tokio::select! {
                    () = execute(command, bridge, target, history) => {}
                    () = &mut shutdown => return Ok(SessionEnd::Interrupted),
                }
            }
        }
    }
}

async fn execute(
    command: ReplCommand,
    bridge: &Bridge,
    target: &StdoutRenderTarget,
    history: &MemoryHistory,
) {
    match command {
        ReplCommand::Open(path) => {
            let Some(interceptor) = target.interceptor() else {
                eprintln!("no document loaded yet");
                return;
            };
            match interceptor.on_click(&ClickEvent::on(Node::anchor(path))) {
                ClickDisposition::Intercepted { path, outcome } => {
                    eprintln!("{path}: {outcome:?}");
                }
                ClickDisposition::Default => eprintln!("not a site link, left to the host"),
            }
        }
        ReplCommand::Call { url, body } => {
            let Some(interceptor) = target.interceptor() else {
                eprintln!("no document loaded yet");
                return;
            };
            let init = match body {
                Some(body) => FetchInit::post(body),
                None => FetchInit::get(),
            };
            match interceptor.fetch(&url, init).await {
                Ok(response) => println!("{}", response.text()),
                Err(rejection) => eprintln!("rejected: {rejection}"),
            }
        }
        ReplCommand::Back => step_history(history.back(), bridge),
        ReplCommand::Forward => step_history(history.forward(), bridge),
        ReplCommand::Status => {
            let m = bridge.metrics().snapshot();
            eprintln!(
                "guard: {:?}, channel: {}, written: {}, consumed: {}, dropped: {}",
                bridge.guard_state(),
                if bridge.is_channel_available() { "ready" } else { "unavailable" },
                m.requests_written,
                m.responses_consumed,
                m.dropped_busy + m.dropped_unavailable,
            );
        }
        ReplCommand::Help => eprintln!("{HELP}"),
        ReplCommand::Empty => {}
        ReplCommand::Unknown(line) => {
            warn!(input = %line, "Unknown command");
            eprintln!("{HELP}");
        }
        ReplCommand::Quit => {}
    }
}

fn step_history(moved: Option<String>, bridge: &Bridge) {
    match moved {
        Some(path) => eprintln!("{path}: {:?}", bridge.on_pop_state()),
        None => eprintln!("no history entry"),
    }
}
