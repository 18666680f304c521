//! colorsync client — entry point.
//!
//! A terminal stand-in for the color picker page: every line typed on stdin
//! is sent to the server as the new color, and every color the server
//! broadcasts is shown as the current "background".
//!
//! # Usage
//!
//! ```text
//! colorsync-client [OPTIONS]
//!
//! Options:
//!   --config <PATH>              TOML config file
//!   --endpoint <URL>             Server WebSocket URL
//!   --reconnect-delay-ms <MS>    Delay before each reconnection attempt
//! ```
//!
//! | Variable                        | Overrides              |
//! |---------------------------------|------------------------|
//! | `COLORSYNC_CONFIG`              | `--config`             |
//! | `COLORSYNC_ENDPOINT`            | `[link] endpoint`      |
//! | `COLORSYNC_RECONNECT_DELAY_MS`  | `[link] reconnect_delay_ms` |
//!
//! Precedence: command line / environment, then config file, then defaults.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  ├─ ColorState          -- shared current color (watch channel)
//!  ├─ LinkManager::spawn  -- WebSocket link, writes NEW_COLOR into ColorState
//!  ├─ run_display         -- logs color and connection changes
//!  └─ picker loop         -- stdin line -> link.send(SET_COLOR, line)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use colorsync_client::application::link_manager::{LinkHandle, LinkManager};
use colorsync_client::infrastructure::{
    color_state::ColorState,
    storage::config::{load_config, ClientConfig},
    transport::websocket::WsConnector,
};
use colorsync_core::ActionKind;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// colorsync client.
///
/// Keeps one color in sync with a colorsync server.  Type a color (e.g.
/// `#ff8800`) and press Enter to share it.
#[derive(Debug, Parser)]
#[command(
    name = "colorsync-client",
    about = "Shares one color with every other colorsync client",
    version
)]
struct Cli {
    /// Path to a TOML config file.  A missing file means defaults.
    #[arg(long, env = "COLORSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// WebSocket URL of the server.
    #[arg(long, env = "COLORSYNC_ENDPOINT")]
    endpoint: Option<String>,

    /// Fixed delay before each reconnection attempt, in milliseconds.
    #[arg(long, env = "COLORSYNC_RECONNECT_DELAY_MS")]
    reconnect_delay_ms: Option<u64>,
}

impl Cli {
    /// Layers the command-line values over `config`.
    fn apply_to(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(endpoint) = &self.endpoint {
            config.link.endpoint = endpoint.clone();
        }
        if let Some(delay) = self.reconnect_delay_ms {
            config.link.reconnect_delay_ms = delay;
        }
        config
    }
}

/// Turns one line of picker input into a color, if it holds one.
fn picked_color(line: &str) -> Option<String> {
    let color = line.trim();
    (!color.is_empty()).then(|| color.to_string())
}

// ── Display ───────────────────────────────────────────────────────────────────

/// Shows the current color and connection status until the link goes away.
async fn run_display(mut color: watch::Receiver<String>, mut connected: watch::Receiver<bool>) {
    info!("background color: {}", *color.borrow_and_update());

    loop {
        tokio::select! {
            changed = color.changed() => {
                if changed.is_err() {
                    break;
                }
                info!("background color: {}", *color.borrow_and_update());
            }
            changed = connected.changed() => {
                if changed.is_err() {
                    break;
                }
                if *connected.borrow_and_update() {
                    info!("connected");
                } else {
                    warn!("disconnected; edits are dropped until the link is back");
                }
            }
        }
    }
}

fn pick(link: &LinkHandle, line: &str) {
    if let Some(color) = picked_color(line) {
        link.send(ActionKind::SetColor, Some(Value::String(color)));
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ClientConfig::default(),
    };
    let config = cli.apply_to(file_config);

    // `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.display.log_level)),
        )
        .init();

    info!("colorsync client starting — endpoint={}", config.link.endpoint);

    let colors = Arc::new(ColorState::new(config.display.initial_color.clone()));
    let (link, link_task) =
        LinkManager::spawn(config.link_config(), Arc::new(WsConnector), colors.clone());

    tokio::spawn(run_display(colors.subscribe(), link.subscribe_connected()));

    // ── Picker loop ───────────────────────────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                match line.context("failed to read stdin")? {
                    Some(line) => pick(&link, &line),
                    None => stdin_open = false,
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl+C")?;
                info!("received Ctrl+C — shutting down");
                break;
            }
        }
    }

    link.shutdown();
    link_task.await.context("link manager task failed")?;

    info!("colorsync client stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_without_flags_keeps_file_values() {
        // Arrange
        let cli = Cli {
            config: None,
            endpoint: None,
            reconnect_delay_ms: None,
        };
        let mut file = ClientConfig::default();
        file.link.endpoint = "ws://from-file/ws/v1/websocket".to_string();

        // Act
        let config = cli.apply_to(file.clone());

        // Assert
        assert_eq!(config, file);
    }

    #[test]
    fn test_cli_endpoint_overrides_file() {
        let cli = Cli::parse_from(["colorsync-client", "--endpoint", "ws://10.0.0.9:8080/ws/v1/websocket"]);

        let config = cli.apply_to(ClientConfig::default());

        assert_eq!(config.link.endpoint, "ws://10.0.0.9:8080/ws/v1/websocket");
    }

    #[test]
    fn test_cli_reconnect_delay_override() {
        let cli = Cli::parse_from(["colorsync-client", "--reconnect-delay-ms", "750"]);

        let config = cli.apply_to(ClientConfig::default());

        assert_eq!(config.link.reconnect_delay_ms, 750);
    }

    #[test]
    fn test_cli_config_path_is_parsed() {
        let cli = Cli::parse_from(["colorsync-client", "--config", "/tmp/colorsync.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/colorsync.toml")));
    }

    #[test]
    fn test_picked_color_trims_input() {
        assert_eq!(picked_color("  #ff8800\n"), Some("#ff8800".to_string()));
    }

    #[test]
    fn test_picked_color_ignores_blank_lines() {
        assert_eq!(picked_color("   "), None);
        assert_eq!(picked_color(""), None);
    }
}
