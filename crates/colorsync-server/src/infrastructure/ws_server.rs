//! WebSocket server: accept loop and per-session task management.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Upgrading connections on `/ws/v1/websocket` to WebSocket sessions
//!    (any other path is answered with HTTP 404).
//! 3. Running two concurrent halves per session:
//!    - **Reader**: reads JSON frames from the client, asks the application
//!      layer what to do, and queues replies or broadcasts through the [`Hub`].
//!    - **Writer**: drains the session's egress channel into the WebSocket and
//!      sends a ping every `ping_interval`.
//! 4. Closing sessions that send no pong within `pong_wait`.
//! 5. Gracefully shutting down when the `running` flag is cleared.
//!
//! # Session lifetime
//!
//! ```text
//! accept ─▶ handshake ─▶ hub.register ─┬─ reader (this task)
//!                                      └─ writer (spawned task)
//!      first one to finish ─▶ hub.remove ─▶ writer sends Close ─▶ done
//! ```
//!
//! Removing the session from the hub drops the egress sender, which is how
//! the writer learns that it has to send a Close frame and stop.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{interval, timeout, timeout_at, Instant, MissedTickBehavior};
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::{
        handshake::server::{ErrorResponse, Request, Response},
        http::StatusCode,
        Error as WsError, Message as WsMessage,
    },
    WebSocketStream,
};
use tracing::{debug, error, info, warn};

use colorsync_core::WEBSOCKET_PATH;

use crate::application::{handle_client_message, Outcome};
use crate::domain::ServerConfig;
use crate::infrastructure::hub::{Hub, SessionId};

/// How long the accept loop waits before re-checking the `running` flag.
const ACCEPT_POLL: Duration = Duration::from_millis(200);

/// How long a finished session waits for its writer to deliver the Close
/// frame.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

type WsSink = SplitSink<WebSocketStream<TcpStream>, WsMessage>;
type WsSource = SplitStream<WebSocketStream<TcpStream>>;

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds `config.bind_addr` and serves clients until `running` is set to
/// `false`.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot be bound (e.g., the port is
/// already in use or the process lacks permission to bind).
pub async fn run_server(config: ServerConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {}", config.bind_addr))?;

    info!("colorsync server listening on {}", config.bind_addr);
    serve(listener, config, running).await
}

/// Runs the accept loop on an already bound listener.
///
/// Every accepted connection gets its own Tokio task, so one slow client
/// never delays the others.  All sessions share one [`Hub`].
///
/// # Errors
///
/// Currently never fails; the `Result` keeps the signature aligned with
/// [`run_server`].
pub async fn serve(
    listener: TcpListener,
    config: ServerConfig,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let config = Arc::new(config);
    let hub = Arc::new(Hub::new());

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        // Short timeout so the `running` flag is checked even when nobody
        // connects.
        match timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                debug!("new connection from {peer_addr}");
                let cfg = Arc::clone(&config);
                let hub = Arc::clone(&hub);
                tokio::spawn(async move {
                    handle_client_session(stream, peer_addr, cfg, hub).await;
                });
            }
            Ok(Err(e)) => {
                // Transient (e.g., too many open file descriptors).
                error!("accept error: {e}");
            }
            Err(_) => {}
        }
    }

    Ok(())
}

// ── Per-session handler ───────────────────────────────────────────────────────

/// Wraps [`run_session`] and logs the outcome.
async fn handle_client_session(
    stream: TcpStream,
    peer_addr: SocketAddr,
    config: Arc<ServerConfig>,
    hub: Arc<Hub>,
) {
    match run_session(stream, peer_addr, config, hub).await {
        Ok(()) => info!("session {peer_addr} closed normally"),
        Err(e) => warn!("session {peer_addr} closed with error: {e:#}"),
    }
}

/// Accepts the upgrade only on [`WEBSOCKET_PATH`].
fn check_path(request: &Request, response: Response) -> Result<Response, ErrorResponse> {
    if request.uri().path() == WEBSOCKET_PATH {
        return Ok(response);
    }
    let mut rejection = ErrorResponse::new(Some("not found".to_string()));
    *rejection.status_mut() = StatusCode::NOT_FOUND;
    Err(rejection)
}

/// Runs the complete lifecycle of one client session.
///
/// # Errors
///
/// Returns an error if the handshake fails, the client sends a malformed
/// frame, or reading from the socket fails.
async fn run_session(
    stream: TcpStream,
    peer_addr: SocketAddr,
    config: Arc<ServerConfig>,
    hub: Arc<Hub>,
) -> anyhow::Result<()> {
    let ws_stream = accept_hdr_async(stream, check_path)
        .await
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;

    let (id, egress) = hub.register(peer_addr).await;
    info!("{id}: WebSocket session established with {peer_addr}");

    let (ws_tx, ws_rx) = ws_stream.split();
    let mut writer = tokio::spawn(write_frames(ws_tx, egress, config.ping_interval, id));
    let mut writer_running = true;

    let result = tokio::select! {
        result = read_frames(ws_rx, id, config.pong_wait, &hub) => result,
        _ = &mut writer => {
            debug!("{id}: writer ended");
            writer_running = false;
            Ok(())
        }
    };

    let token = hub.token(id).await;
    hub.remove(id).await;
    info!(
        "{id}: left (token {}); {} client(s) connected",
        token.as_deref().unwrap_or("none"),
        hub.len().await
    );

    if writer_running && timeout(CLOSE_GRACE, &mut writer).await.is_err() {
        debug!("{id}: writer did not finish in time; aborting");
        writer.abort();
    }

    result
}

// ── Reader ────────────────────────────────────────────────────────────────────

/// Reads client frames until the client leaves, misses a pong, or sends a
/// malformed frame.
///
/// The pong deadline is restarted by pongs only: a client that keeps sending
/// text but never answers pings is still dropped.
async fn read_frames(
    mut ws_rx: WsSource,
    id: SessionId,
    pong_wait: Duration,
    hub: &Hub,
) -> anyhow::Result<()> {
    let mut deadline = Instant::now() + pong_wait;

    loop {
        let frame = match timeout_at(deadline, ws_rx.next()).await {
            Err(_) => {
                warn!("{id}: no pong within {pong_wait:?}; closing");
                return Ok(());
            }
            Ok(None) => {
                debug!("{id}: stream ended");
                return Ok(());
            }
            Ok(Some(Err(WsError::ConnectionClosed | WsError::Protocol(_)))) => {
                debug!("{id}: connection closed");
                return Ok(());
            }
            Ok(Some(Err(e))) => {
                return Err(e).with_context(|| format!("{id}: WebSocket read failed"));
            }
            Ok(Some(Ok(frame))) => frame,
        };

        match frame {
            WsMessage::Text(text) => {
                let outcome =
                    handle_client_message(&text).with_context(|| format!("{id}: bad frame"))?;
                deliver(hub, id, outcome).await;
            }
            WsMessage::Pong(_) => {
                deadline = Instant::now() + pong_wait;
            }
            WsMessage::Ping(_) => {
                // Answered by tungstenite on the next write.
                debug!("{id}: ping from client");
            }
            WsMessage::Binary(_) => {
                warn!("{id}: unexpected binary frame (ignored)");
            }
            WsMessage::Close(_) => {
                debug!("{id}: Close frame received");
                return Ok(());
            }
            WsMessage::Frame(_) => {}
        }
    }
}

/// Queues the frames an [`Outcome`] asks for.
async fn deliver(hub: &Hub, id: SessionId, outcome: Outcome) {
    match outcome {
        Outcome::Identify { token, reply } => {
            hub.identify(id, token).await;
            hub.send_to(id, reply).await;
        }
        Outcome::Reply(reply) => {
            hub.send_to(id, reply).await;
        }
        Outcome::Broadcast(frame) => {
            let delivered = hub.broadcast(&frame).await;
            debug!("{id}: broadcast to {delivered} client(s)");
        }
    }
}

// ── Writer ────────────────────────────────────────────────────────────────────

/// Writes queued frames and periodic pings until the egress channel closes.
async fn write_frames(
    mut ws_tx: WsSink,
    mut egress: mpsc::UnboundedReceiver<String>,
    ping_interval: Duration,
    id: SessionId,
) {
    let mut ticker = interval(ping_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await; // The first tick completes immediately.

    loop {
        tokio::select! {
            frame = egress.recv() => {
                let Some(text) = frame else {
                    if let Err(e) = ws_tx.send(WsMessage::Close(None)).await {
                        debug!("{id}: failed to send Close: {e}");
                    }
                    return;
                };
                if let Err(e) = ws_tx.send(WsMessage::Text(text)).await {
                    debug!("{id}: send failed (client gone): {e}");
                    return;
                }
            }
            _ = ticker.tick() => {
                if let Err(e) = ws_tx.send(WsMessage::Ping(Vec::new())).await {
                    debug!("{id}: ping failed: {e}");
                    return;
                }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
