//! TOML configuration file for the client.
//!
//! ```toml
//! [link]
//! endpoint = "ws://localhost:8080/ws/v1/websocket"
//! reconnect_delay_ms = 5000
//!
//! [display]
//! initial_color = "#fff"
//! log_level = "info"
//! ```
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration.  Command-line flags override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use colorsync_core::DEFAULT_ENDPOINT;
use serde::Deserialize;
use thiserror::Error;

use crate::application::link_manager::LinkConfig;
use crate::infrastructure::color_state::DEFAULT_COLOR;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default)]
    pub link: LinkSettings,
    #[serde(default)]
    pub display: DisplaySettings,
}

/// Where to connect and how to reconnect.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LinkSettings {
    /// WebSocket URL of the colorsync server.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Fixed delay before each reconnection attempt, in milliseconds.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

/// Local presentation settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DisplaySettings {
    /// Color shown until the server broadcasts one.
    #[serde(default = "default_initial_color")]
    pub initial_color: String,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}
fn default_reconnect_delay_ms() -> u64 {
    5000
}
fn default_initial_color() -> String {
    DEFAULT_COLOR.to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            initial_color: default_initial_color(),
            log_level: default_log_level(),
        }
    }
}

impl ClientConfig {
    /// The settings the link manager needs.
    pub fn link_config(&self) -> LinkConfig {
        LinkConfig {
            endpoint: self.link.endpoint.clone(),
            reconnect_delay: Duration::from_millis(self.link.reconnect_delay_ms),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Loads the config from `path`, returning `ClientConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ClientConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
