//! WebSocket transport built on `tokio-tungstenite`.
//!
//! Each call to [`WsConnector::open`] spawns one connection task:
//!
//! ```text
//!   WsTransport::send_text ──► mpsc ──┐
//!                                     ▼
//!                          connection task ──► WebSocket sink
//!   EventSink ◄─────────────────────┘ ◄──── WebSocket stream
//! ```
//!
//! Event reporting follows browser WebSocket semantics so the link manager
//! sees the same sequence either way:
//!
//! - connect failure → `error`, then `closed`
//! - read/write failure → `error`, then `closed`
//! - close frame or end of stream → `closed`
//!
//! Closing the transport locally (or dropping it) sends a close frame and
//! ends the task without reporting anything.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use crate::application::transport::{Connector, EventSink, Transport, TransportError};

/// Opens real WebSocket connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn open(&self, endpoint: &str, sink: EventSink) -> Box<dyn Transport> {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_connection(endpoint.to_string(), sink, rx));
        Box::new(WsTransport { outgoing: Some(tx) })
    }
}

/// Write side of one WebSocket connection.
struct WsTransport {
    /// `None` once closed.  Dropping the sender tells the task to finish.
    outgoing: Option<mpsc::UnboundedSender<String>>,
}

impl Transport for WsTransport {
    fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        let tx = self.outgoing.as_ref().ok_or(TransportError::Closed)?;
        tx.send(text).map_err(|_| TransportError::Closed)
    }

    fn close(&mut self) {
        self.outgoing = None;
    }
}

async fn run_connection(
    endpoint: String,
    sink: EventSink,
    mut outgoing: mpsc::UnboundedReceiver<String>,
) {
    let id = sink.connection_id();

    let ws = tokio::select! {
        result = tokio_tungstenite::connect_async(endpoint.as_str()) => match result {
            Ok((ws, _response)) => ws,
            Err(e) => {
                sink.error(TransportError::Connect {
                    endpoint,
                    reason: e.to_string(),
                });
                sink.closed();
                return;
            }
        },
        None = outgoing.recv() => {
            debug!(connection = %id, "closed before the connection was established");
            return;
        }
    };

    sink.opened();
    let (mut write, mut read) = ws.split();

    loop {
        tokio::select! {
            out = outgoing.recv() => match out {
                Some(text) => {
                    if let Err(e) = write.send(Message::Text(text)).await {
                        sink.error(TransportError::Stream(e.to_string()));
                        sink.closed();
                        return;
                    }
                }
                None => {
                    debug!(connection = %id, "closing WebSocket");
                    let _ = write.close().await;
                    return;
                }
            },

            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => sink.message(text),
                Some(Ok(Message::Binary(data))) => {
                    warn!(connection = %id, "ignoring {}-byte binary frame", data.len());
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(connection = %id, ?frame, "server closed the connection");
                    sink.closed();
                    return;
                }
                // Ping/pong are answered by tungstenite itself.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    sink.error(TransportError::Stream(e.to_string()));
                    sink.closed();
                    return;
                }
                None => {
                    sink.closed();
                    return;
                }
            },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::link_manager::LinkInput;
    use crate::application::link_state::ConnectionId;
    use crate::application::transport::TransportEvent;

    #[tokio::test]
    async fn test_refused_connection_reports_error_then_closed() {
        // Arrange: grab a free port and release it so nothing listens there.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(ConnectionId(1), tx);

        // Act
        let _transport = WsConnector.open(&format!("ws://127.0.0.1:{port}/ws/v1/websocket"), sink);

        // Assert
        match rx.recv().await {
            Some(LinkInput::Transport(ConnectionId(1), TransportEvent::Error(err))) => {
                assert!(matches!(err, TransportError::Connect { .. }));
            }
            other => panic!("expected an error event, got {other:?}"),
        }
        assert!(matches!(
            rx.recv().await,
            Some(LinkInput::Transport(ConnectionId(1), TransportEvent::Closed))
        ));
    }

    #[tokio::test]
    async fn test_send_after_close_is_rejected() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut transport = WsConnector.open("ws://127.0.0.1:9/ws", EventSink::new(ConnectionId(1), tx));

        transport.close();

        assert_eq!(
            transport.send_text("x".to_string()),
            Err(TransportError::Closed)
        );
    }
}
