//! FSK bridge CLI - Main entry point.
//!
//! - `demo` runs the whole bridge against an in-process runtime
//! - `attach` drives a real runtime through a shared directory

use anyhow::Result;
use clap::Parser;

use fsk_bridge_cli::cli::{Cli, dispatch_command};
use fsk_bridge_cli::logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Held until exit so the debug log gets flushed.
    let _log_guard = logging::init(cli.log_level, cli.debug)?;

    dispatch_command(cli).await
}
