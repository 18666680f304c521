//! Port for the full-duplex text channel to the server.
//!
//! A [`Connector`] creates one [`Transport`] per connection attempt.  Opening
//! never blocks: the transport reports what happens to it afterwards
//! (`opened`, `message`, `error`, `closed`) through the [`EventSink`] it was
//! given.  Every event is tagged with the [`ConnectionId`] of the attempt, so
//! the link manager can recognise and ignore events from a transport it has
//! already replaced.

use thiserror::Error;
use tokio::sync::mpsc;

use crate::application::link_manager::LinkInput;
use crate::application::link_state::ConnectionId;

/// Errors reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("failed to connect to {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },

    /// Reading from or writing to an established connection failed.
    #[error("connection I/O error: {0}")]
    Stream(String),

    /// The transport was already closed when a write was attempted.
    #[error("transport is closed")]
    Closed,
}

/// Something that happened to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection is open and writable.
    Opened,
    /// A text frame arrived.
    Message(String),
    /// The connection failed.  A `Closed` event usually follows.
    Error(TransportError),
    /// The connection is gone (clean or not).
    Closed,
}

/// Channel through which one transport reports its events.
///
/// Cheap to clone.  Reporting after the link manager stopped is silently
/// ignored.
#[derive(Debug, Clone)]
pub struct EventSink {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<LinkInput>,
}

impl EventSink {
    pub(crate) fn new(id: ConnectionId, tx: mpsc::UnboundedSender<LinkInput>) -> Self {
        Self { id, tx }
    }

    /// The connection attempt this sink reports for.
    pub fn connection_id(&self) -> ConnectionId {
        self.id
    }

    /// Reports a raw event.
    pub fn report(&self, event: TransportEvent) {
        // A closed receiver means the link manager has shut down.
        let _ = self.tx.send(LinkInput::Transport(self.id, event));
    }

    pub fn opened(&self) {
        self.report(TransportEvent::Opened);
    }

    pub fn message(&self, text: impl Into<String>) {
        self.report(TransportEvent::Message(text.into()));
    }

    pub fn error(&self, err: TransportError) {
        self.report(TransportEvent::Error(err));
    }

    pub fn closed(&self) {
        self.report(TransportEvent::Closed);
    }
}

/// One live connection attempt, exclusively owned by the link manager.
pub trait Transport: Send {
    /// Queues a text frame for sending.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] if the transport can no longer send.
    fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Closes the connection.  No events are reported afterwards.
    fn close(&mut self);
}

/// Factory for transports.
pub trait Connector: Send + Sync {
    /// Starts connecting to `endpoint` and returns immediately.
    fn open(&self, endpoint: &str, sink: EventSink) -> Box<dyn Transport>;
}

// ── Tests ─────────────────────────────────────────────────────────────────────
