//! The link manager task.
//!
//! A single tokio task owns the [`LinkState`], the current [`Transport`] and
//! the reconnect timer.  Everything that can happen to the link arrives on
//! one unbounded channel and is handled in arrival order:
//!
//! ```text
//!   transport events ─┐
//!   timer firings ────┼──► LinkInput channel ──► LinkManager::run()
//!   LinkHandle calls ─┘                              │
//!                                                    ├─ transition()  (pure)
//!                                                    └─ perform(effects)
//! ```
//!
//! Callers interact through a cloneable [`LinkHandle`]: `send` and
//! `shutdown` only enqueue, they never wait for the network.  Dropping the
//! last handle tears the link down as if `shutdown` had been called.

use std::sync::Arc;
use std::time::Duration;

use colorsync_core::{encode_message, ActionKind, OutboundMessage, DEFAULT_ENDPOINT};
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::application::color_store::ColorStore;
use crate::application::dispatch::dispatch_inbound;
use crate::application::link_state::{
    transition, ConnectionId, Effect, FailureReason, LinkEvent, LinkPhase, LinkState, TimerId,
    DEFAULT_RECONNECT_DELAY,
};
use crate::application::transport::{Connector, EventSink, Transport, TransportEvent};

/// Settings for one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// WebSocket URL of the colorsync server.
    pub endpoint: String,
    /// Wait between a failure and the next connection attempt.
    pub reconnect_delay: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

/// Everything the link manager task reacts to.
#[derive(Debug)]
pub(crate) enum LinkInput {
    Activate,
    Transport(ConnectionId, TransportEvent),
    ReconnectDue(TimerId),
    Send {
        action: ActionKind,
        payload: Option<Value>,
    },
    Teardown,
}

// ── Handle ────────────────────────────────────────────────────────────────────

/// Cheap, cloneable interface to a running link.
#[derive(Debug, Clone)]
pub struct LinkHandle {
    tx: mpsc::UnboundedSender<LinkInput>,
    connected: watch::Receiver<bool>,
    _owner: Arc<HandleOwner>,
}

/// Shared by every clone of a [`LinkHandle`]; requests teardown when the
/// last clone goes away.
#[derive(Debug)]
struct HandleOwner {
    tx: mpsc::UnboundedSender<LinkInput>,
}

impl Drop for HandleOwner {
    fn drop(&mut self) {
        debug!("last link handle dropped; tearing down");
        let _ = self.tx.send(LinkInput::Teardown);
    }
}

impl LinkHandle {
    /// `true` while the link's transport is open.
    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    /// Returns a receiver that observes every change of `is_connected`.
    pub fn subscribe_connected(&self) -> watch::Receiver<bool> {
        self.connected.clone()
    }

    /// Sends `action` with an optional payload.  Fire-and-forget: the message
    /// is dropped with a warning if the link is not connected when the task
    /// gets to it.
    pub fn send(&self, action: ActionKind, payload: Option<Value>) {
        if self.tx.send(LinkInput::Send { action, payload }).is_err() {
            warn!("dropping {action}: link manager has stopped");
        }
    }

    /// Tears the link down: closes the transport and cancels any pending
    /// reconnect.  Idempotent.
    pub fn shutdown(&self) {
        let _ = self.tx.send(LinkInput::Teardown);
    }
}

// ── Manager ───────────────────────────────────────────────────────────────────

/// Owner of one link's state, transport and timer.
pub struct LinkManager {
    endpoint: String,
    state: LinkState,
    connector: Arc<dyn Connector>,
    store: Arc<dyn ColorStore>,
    transport: Option<Box<dyn Transport>>,
    timer: Option<(TimerId, JoinHandle<()>)>,
    // Weak, so the channel closes once no handle, transport or timer can
    // still produce input.
    tx: mpsc::WeakUnboundedSender<LinkInput>,
    rx: mpsc::UnboundedReceiver<LinkInput>,
    connected: watch::Sender<bool>,
}

impl LinkManager {
    /// Creates a manager and the handle that controls it.  Nothing happens
    /// until [`LinkManager::run`] is polled.
    pub fn new(
        config: LinkConfig,
        connector: Arc<dyn Connector>,
        store: Arc<dyn ColorStore>,
    ) -> (Self, LinkHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (connected, connected_rx) = watch::channel(false);
        let handle = LinkHandle {
            tx: tx.clone(),
            connected: connected_rx,
            _owner: Arc::new(HandleOwner { tx: tx.clone() }),
        };
        let manager = Self {
            endpoint: config.endpoint,
            state: LinkState::new(config.reconnect_delay),
            connector,
            store,
            transport: None,
            timer: None,
            tx: tx.downgrade(),
            rx,
            connected,
        };
        (manager, handle)
    }

    /// Spawns the manager on the current tokio runtime and activates it.
    pub fn spawn(
        config: LinkConfig,
        connector: Arc<dyn Connector>,
        store: Arc<dyn ColorStore>,
    ) -> (LinkHandle, JoinHandle<()>) {
        let (manager, handle) = Self::new(config, connector, store);
        let task = tokio::spawn(manager.run());
        (handle, task)
    }

    /// Processes inputs until the link is torn down.
    pub async fn run(mut self) {
        info!(endpoint = %self.endpoint, "link manager starting");
        self.handle(LinkInput::Activate);

        while !self.is_shut_down() {
            match self.rx.recv().await {
                Some(input) => self.handle(input),
                None => self.handle(LinkInput::Teardown),
            }
        }
        info!("link manager stopped");
    }

    fn is_shut_down(&self) -> bool {
        self.state.phase() == LinkPhase::Shutdown
    }

    fn handle(&mut self, input: LinkInput) {
        let event = match input {
            LinkInput::Activate => LinkEvent::Activate,
            LinkInput::Teardown => LinkEvent::Teardown,
            LinkInput::ReconnectDue(timer) => LinkEvent::ReconnectDue(timer),
            LinkInput::Transport(id, event) => match event {
                TransportEvent::Opened => LinkEvent::Opened(id),
                TransportEvent::Message(text) => LinkEvent::Message(id, text),
                TransportEvent::Error(err) => LinkEvent::Failed {
                    id,
                    reason: FailureReason::Error(err),
                },
                TransportEvent::Closed => LinkEvent::Failed {
                    id,
                    reason: FailureReason::Closed,
                },
            },
            LinkInput::Send { action, payload } => {
                self.send(action, payload);
                return;
            }
        };

        let (next, effects) = transition(&self.state, event);
        self.state = next;
        for effect in effects {
            self.perform(effect);
        }
    }

    fn perform(&mut self, effect: Effect) {
        match effect {
            Effect::OpenTransport(id) => {
                self.close_transport();
                let Some(tx) = self.tx.upgrade() else {
                    debug!(connection = %id, "no one is listening; not connecting");
                    return;
                };
                info!(connection = %id, "connecting to {}", self.endpoint);
                let sink = EventSink::new(id, tx);
                self.transport = Some(self.connector.open(&self.endpoint, sink));
            }
            Effect::CloseTransport(id) => {
                debug!(connection = %id, "closing transport");
                self.close_transport();
            }
            Effect::SendInit => {
                self.write(ActionKind::Init, None);
            }
            Effect::SetConnected(connected) => {
                self.connected.send_if_modified(|current| {
                    let changed = *current != connected;
                    *current = connected;
                    changed
                });
            }
            Effect::LogFailure(id, reason) => match reason {
                FailureReason::Error(err) => error!(connection = %id, "link error: {err}"),
                FailureReason::Closed => info!(connection = %id, "link closed"),
            },
            Effect::CancelReconnect(timer) => {
                if let Some((pending, task)) = self.timer.take() {
                    debug!("cancelling {pending} (requested {timer})");
                    task.abort();
                }
            }
            Effect::ScheduleReconnect(timer, delay) => {
                if let Some((_, task)) = self.timer.take() {
                    task.abort();
                }
                let Some(tx) = self.tx.upgrade() else {
                    debug!("no one is listening; not scheduling {timer}");
                    return;
                };
                info!("reconnecting in {delay:?}");
                let task = tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(LinkInput::ReconnectDue(timer));
                });
                self.timer = Some((timer, task));
            }
            Effect::Dispatch(text) => {
                dispatch_inbound(&text, self.store.as_ref());
            }
        }
    }

    fn send(&mut self, action: ActionKind, payload: Option<Value>) {
        if !self.state.is_connected() {
            warn!("dropping {action}: link is not connected");
            return;
        }
        self.write(action, payload);
    }

    /// Builds the envelope with a fresh token and writes it to the transport.
    fn write(&mut self, action: ActionKind, payload: Option<Value>) {
        let Some(transport) = self.transport.as_mut() else {
            warn!("dropping {action}: no transport");
            return;
        };
        let text = match encode_message(&OutboundMessage::new(action, payload)) {
            Ok(text) => text,
            Err(e) => {
                error!("failed to encode {action}: {e}");
                return;
            }
        };
        match transport.send_text(text) {
            Ok(()) => debug!("sent {action}"),
            Err(e) => warn!("failed to send {action}: {e}"),
        }
    }

    fn close_transport(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
    }
}
