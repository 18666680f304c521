//! colorsync server — entry point.
//!
//! Accepts WebSocket connections on `/ws/v1/websocket` and keeps every
//! connected client's color in sync: a `SET_COLOR` from any client is
//! broadcast to all of them as `NEW_COLOR`.
//!
//! # Usage
//!
//! ```text
//! colorsync-server [OPTIONS]
//!
//! Options:
//!   --bind <ADDR>               IP address to listen on [default: 0.0.0.0]
//!   --port <PORT>               TCP port to listen on [default: 8080]
//!   --ping-interval-ms <MS>     Interval between pings [default: 9000]
//!   --pong-wait-ms <MS>         Silence allowed before a client is dropped [default: 10000]
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                       | Default    |
//! |--------------------------------|------------|
//! | `COLORSYNC_BIND`               | `0.0.0.0`  |
//! | `COLORSYNC_PORT`               | `8080`     |
//! | `COLORSYNC_PING_INTERVAL_MS`   | `9000`     |
//! | `COLORSYNC_PONG_WAIT_MS`       | `10000`    |
//!
//! CLI args take precedence when both are present.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::{ensure, Context};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use colorsync_server::domain::ServerConfig;
use colorsync_server::infrastructure::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// colorsync broadcast server.
#[derive(Debug, Parser)]
#[command(
    name = "colorsync-server",
    about = "Broadcasts the shared color to every colorsync client",
    version
)]
struct Cli {
    /// IP address to bind to.
    ///
    /// Use `0.0.0.0` to accept connections from any network interface, or
    /// `127.0.0.1` to accept only local connections.
    #[arg(long, default_value = "0.0.0.0", env = "COLORSYNC_BIND")]
    bind: String,

    /// TCP port to listen on.
    #[arg(long, default_value_t = 8080, env = "COLORSYNC_PORT")]
    port: u16,

    /// Interval between WebSocket pings, in milliseconds.
    #[arg(long, default_value_t = 9000, env = "COLORSYNC_PING_INTERVAL_MS")]
    ping_interval_ms: u64,

    /// How long a client may go without a pong, in milliseconds.
    ///
    /// Must be larger than `--ping-interval-ms`.
    #[arg(long, default_value_t = 10000, env = "COLORSYNC_PONG_WAIT_MS")]
    pong_wait_ms: u64,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--bind` is not a valid IP address, or if pings
    /// would not be sent before `--pong-wait-ms` runs out.
    fn into_server_config(self) -> anyhow::Result<ServerConfig> {
        let bind_addr: SocketAddr = format!("{}:{}", self.bind, self.port)
            .parse()
            .with_context(|| format!("invalid bind address: '{}:{}'", self.bind, self.port))?;

        let config = ServerConfig {
            bind_addr,
            ping_interval: Duration::from_millis(self.ping_interval_ms),
            pong_wait: Duration::from_millis(self.pong_wait_ms),
        };
        ensure!(
            config.keepalive_is_consistent(),
            "--ping-interval-ms ({}) must be non-zero and below --pong-wait-ms ({})",
            self.ping_interval_ms,
            self.pong_wait_ms
        );
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `RUST_LOG` controls the level; `info` otherwise.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_server_config()?;

    info!(
        "colorsync server starting — bind={}, ping={:?}, pong_wait={:?}",
        config.bind_addr, config.ping_interval, config.pong_wait
    );

    // Cleared by Ctrl+C; the accept loop checks it every 200 ms.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C — initiating graceful shutdown");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    run_server(config, running).await?;

    info!("colorsync server stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
