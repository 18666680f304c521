//! Server configuration.
//!
//! [`ServerConfig`] holds every runtime setting of the broadcast server.  It
//! is filled from CLI arguments in `main.rs`, or from [`Default`] in tests
//! and local development.

use std::net::SocketAddr;
use std::time::Duration;

/// All runtime configuration for the broadcast server.
///
/// # Example
///
/// ```rust
/// use colorsync_server::domain::ServerConfig;
///
/// let cfg = ServerConfig::default();
/// assert_eq!(cfg.bind_addr.port(), 8080);
/// assert!(cfg.ping_interval < cfg.pong_wait);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.  `0.0.0.0` accepts
    /// connections on every interface.
    pub bind_addr: SocketAddr,

    /// How often each client is sent a WebSocket ping.
    ///
    /// Must be shorter than `pong_wait`, otherwise healthy clients are
    /// dropped between two pings.
    pub ping_interval: Duration,

    /// How long a client may stay silent (no pong) before its session is
    /// closed.  Restarted by every pong.
    pub pong_wait: Duration,
}

impl Default for ServerConfig {
    /// | Field           | Default          |
    /// |-----------------|------------------|
    /// | bind_addr       | `0.0.0.0:8080`   |
    /// | ping_interval   | 9 seconds        |
    /// | pong_wait       | 10 seconds       |
    fn default() -> Self {
        Self {
            // Compile-time-known valid socket address.
            bind_addr: "0.0.0.0:8080".parse().unwrap(),
            ping_interval: Duration::from_secs(9),
            pong_wait: Duration::from_secs(10),
        }
    }
}

impl ServerConfig {
    /// `true` when pings are sent often enough to satisfy `pong_wait`.
    pub fn keepalive_is_consistent(&self) -> bool {
        !self.ping_interval.is_zero() && self.ping_interval < self.pong_wait
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port_is_8080() {
        // Arrange / Act
        let cfg = ServerConfig::default();
        // Assert
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert!(cfg.bind_addr.ip().is_unspecified());
    }

    #[test]
    fn test_default_ping_interval_is_nine_tenths_of_pong_wait() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.ping_interval, cfg.pong_wait * 9 / 10);
    }

    #[test]
    fn test_default_keepalive_is_consistent() {
        assert!(ServerConfig::default().keepalive_is_consistent());
    }

    #[test]
    fn test_ping_slower_than_pong_wait_is_inconsistent() {
        let cfg = ServerConfig {
            ping_interval: Duration::from_secs(10),
            pong_wait: Duration::from_secs(10),
            ..ServerConfig::default()
        };
        assert!(!cfg.keepalive_is_consistent());
    }

    #[test]
    fn test_zero_ping_interval_is_inconsistent() {
        let cfg = ServerConfig {
            ping_interval: Duration::ZERO,
            ..ServerConfig::default()
        };
        assert!(!cfg.keepalive_is_consistent());
    }
}
