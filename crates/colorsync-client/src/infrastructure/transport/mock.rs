//! In-memory transport for tests.
//!
//! # Why a mock connector?
//!
//! The link manager's interesting behavior (reconnect timing, stale-event
//! guards, `INIT_CONNECTION` on open) depends on the exact order in which a
//! transport reports `opened`, `message`, `error` and `closed`.  A real
//! server cannot be made to produce every ordering on demand.
//!
//! [`MockConnector`] records every connection the link manager opens and
//! hands back a [`MockConnection`] through which a test plays the server:
//!
//! ```ignore
//! let connector = MockConnector::new();
//! let (link, _task) = LinkManager::spawn(config, Arc::new(connector.clone()), store);
//!
//! let conn = connector.wait_for_connection(0).await;
//! conn.open();
//! conn.receive(r##"{"action":"NEW_COLOR","payload":"#ff0000"}"##);
//! conn.close_remote();
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::application::link_state::ConnectionId;
use crate::application::transport::{
    Connector, EventSink, Transport, TransportError, TransportEvent,
};

/// Records connections instead of touching the network.  Clones share state.
#[derive(Clone, Default)]
pub struct MockConnector {
    connections: Arc<Mutex<Vec<MockConnection>>>,
    opened: Arc<Notify>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of connections opened so far.
    pub fn connection_count(&self) -> usize {
        self.lock().len()
    }

    /// The `index`-th connection opened, if it exists.
    pub fn connection(&self, index: usize) -> Option<MockConnection> {
        self.lock().get(index).cloned()
    }

    /// Waits until at least `index + 1` connections were opened and returns
    /// the `index`-th one.
    pub async fn wait_for_connection(&self, index: usize) -> MockConnection {
        loop {
            let notified = self.opened.notified();
            if let Some(conn) = self.connection(index) {
                return conn;
            }
            notified.await;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<MockConnection>> {
        self.connections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Connector for MockConnector {
    fn open(&self, endpoint: &str, sink: EventSink) -> Box<dyn Transport> {
        let conn = MockConnection {
            endpoint: endpoint.to_string(),
            sink,
            sent: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(AtomicBool::new(false)),
        };
        self.lock().push(conn.clone());
        self.opened.notify_waiters();
        Box::new(MockTransport {
            sent: Arc::clone(&conn.sent),
            closed: Arc::clone(&conn.closed),
        })
    }
}

/// Test-side view of one opened connection.
#[derive(Clone)]
pub struct MockConnection {
    endpoint: String,
    sink: EventSink,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl MockConnection {
    pub fn id(&self) -> ConnectionId {
        self.sink.connection_id()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Every text frame the link manager wrote, in order.
    pub fn sent(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// `true` once the link manager closed this transport.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Reports the connection as open.
    pub fn open(&self) {
        self.sink.report(TransportEvent::Opened);
    }

    /// Delivers a text frame from the "server".
    pub fn receive(&self, text: &str) {
        self.sink.message(text);
    }

    /// Reports a transport error.
    pub fn fail(&self, reason: &str) {
        self.sink.error(TransportError::Stream(reason.to_string()));
    }

    /// Reports the connection as closed by the remote side.
    pub fn close_remote(&self) {
        self.sink.closed();
    }
}

struct MockTransport {
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl Transport for MockTransport {
    fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(text);
        Ok(())
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
