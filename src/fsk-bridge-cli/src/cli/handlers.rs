//! Command dispatch.

use std::path::Path;

use anyhow::{Context, Result};
use fsk_bridge::BridgeConfig;
use tracing::debug;

use super::args::{Cli, Commands};

/// Load the bridge configuration, then apply `FSK_BRIDGE_*` overrides.
pub fn load_config(path: Option<&Path>) -> Result<BridgeConfig> {
    let config = match path {
        Some(path) => BridgeConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => BridgeConfig::default(),
    };

    config
        .with_env_overrides()
        .context("Invalid FSK_BRIDGE_* environment override")
}

/// Dispatch the parsed command.
pub async fn dispatch_command(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    debug!(?config, "Configuration loaded");

    match cli.command {
        Commands::Demo(demo) => demo.run(config).await,
        Commands::Attach(attach) => attach.run(config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.toml");
        std::fs::write(&path, "api_poll_interval_ms = 20\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.api_poll_interval_ms, 20);
        assert_eq!(config.request_artifact, "request.tmp");
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }
}
