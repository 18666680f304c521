//! Registry of connected clients.
//!
//! Every session registers itself here and receives the receiving end of an
//! unbounded "egress" channel.  Anything sent into that channel is written to
//! the client's WebSocket by the session's writer task, so broadcasting is
//! just a loop over the registered senders.
//!
//! Removing a client drops its sender.  The writer task sees the channel
//! close, sends a WebSocket Close frame, and the session ends.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, RwLock};
use tracing::debug;

/// Server-local identifier of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

#[derive(Debug)]
struct ClientEntry {
    peer: SocketAddr,
    /// Authorization token of the `INIT_CONNECTION` frame, once received.
    token: Option<String>,
    egress: mpsc::UnboundedSender<String>,
}

/// Shared set of connected clients.
#[derive(Debug, Default)]
pub struct Hub {
    clients: RwLock<HashMap<SessionId, ClientEntry>>,
    next_id: AtomicU64,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a client and returns its id plus the stream of frames to write
    /// to it.
    pub async fn register(&self, peer: SocketAddr) -> (SessionId, mpsc::UnboundedReceiver<String>) {
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (egress, rx) = mpsc::unbounded_channel();
        let mut clients = self.clients.write().await;
        clients.insert(
            id,
            ClientEntry {
                peer,
                token: None,
                egress,
            },
        );
        debug!("{id} registered from {peer}; {} client(s)", clients.len());
        (id, rx)
    }

    /// Records the token a client introduced itself with.
    pub async fn identify(&self, id: SessionId, token: String) {
        if let Some(entry) = self.clients.write().await.get_mut(&id) {
            debug!("{id} ({}) identified as {token}", entry.peer);
            entry.token = Some(token);
        }
    }

    /// Returns the token a client identified with, if any.
    pub async fn token(&self, id: SessionId) -> Option<String> {
        self.clients
            .read()
            .await
            .get(&id)
            .and_then(|entry| entry.token.clone())
    }

    /// Queues `text` for one client.  Returns `false` if it is gone.
    pub async fn send_to(&self, id: SessionId, text: String) -> bool {
        match self.clients.read().await.get(&id) {
            Some(entry) => entry.egress.send(text).is_ok(),
            None => false,
        }
    }

    /// Queues `text` for every client and returns how many accepted it.
    pub async fn broadcast(&self, text: &str) -> usize {
        self.clients
            .read()
            .await
            .values()
            .filter(|entry| entry.egress.send(text.to_string()).is_ok())
            .count()
    }

    /// Drops a client.  Returns `false` if it was already removed.
    pub async fn remove(&self, id: SessionId) -> bool {
        let mut clients = self.clients.write().await;
        let removed = clients.remove(&id).is_some();
        if removed {
            debug!("{id} removed; {} client(s) left", clients.len());
        }
        removed
    }

    /// Number of connected clients.
    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    #[tokio::test]
    async fn test_register_assigns_distinct_ids() {
        // Arrange
        let hub = Hub::new();

        // Act
        let (a, _ra) = hub.register(peer()).await;
        let (b, _rb) = hub.register(peer()).await;

        // Assert
        assert_ne!(a, b);
        assert_eq!(hub.len().await, 2);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_client() {
        // Arrange
        let hub = Hub::new();
        let (_a, mut ra) = hub.register(peer()).await;
        let (_b, mut rb) = hub.register(peer()).await;

        // Act
        let delivered = hub.broadcast("hello").await;

        // Assert
        assert_eq!(delivered, 2);
        assert_eq!(ra.recv().await.as_deref(), Some("hello"));
        assert_eq!(rb.recv().await.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_send_to_reaches_only_that_client() {
        let hub = Hub::new();
        let (a, mut ra) = hub.register(peer()).await;
        let (_b, mut rb) = hub.register(peer()).await;

        assert!(hub.send_to(a, "just you".to_string()).await);

        assert_eq!(ra.recv().await.as_deref(), Some("just you"));
        assert!(rb.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_identify_stores_token() {
        let hub = Hub::new();
        let (a, _ra) = hub.register(peer()).await;

        hub.identify(a, "tok-42".to_string()).await;

        assert_eq!(hub.token(a).await.as_deref(), Some("tok-42"));
    }

    #[tokio::test]
    async fn test_remove_closes_egress_channel() {
        // Arrange
        let hub = Hub::new();
        let (a, mut ra) = hub.register(peer()).await;

        // Act
        let first = hub.remove(a).await;
        let second = hub.remove(a).await;

        // Assert
        assert!(first);
        assert!(!second, "removing twice is a no-op");
        assert_eq!(hub.len().await, 0);
        assert_eq!(ra.recv().await, None);
        assert!(!hub.send_to(a, "late".to_string()).await);
    }

    #[tokio::test]
    async fn test_broadcast_skips_clients_whose_writer_is_gone() {
        let hub = Hub::new();
        let (_a, ra) = hub.register(peer()).await;
        let (_b, _rb) = hub.register(peer()).await;
        drop(ra);

        assert_eq!(hub.broadcast("x").await, 1);
    }
}
