//! Connection lifecycle of the link manager as a pure state machine.
//!
//! ```text
//!                 Activate                Opened
//!  Disconnected ───────────► Connecting ─────────► Connected
//!                              ▲    │                  │
//!                 ReconnectDue │    │ Failed           │ Failed
//!                              │    ▼                  ▼
//!                           ReconnectPending ◄─────────┘
//!
//!  Teardown (from any phase) ──► Shutdown  (terminal)
//! ```
//!
//! [`transition`] maps `(state, event)` to `(next state, effects)`.  It never
//! performs I/O; the caller executes the returned [`Effect`]s in order.
//!
//! # Stale events
//!
//! Every connection attempt gets a fresh [`ConnectionId`] and every reconnect
//! timer a fresh [`TimerId`].  Events carrying an id that is no longer current
//! (a transport that was replaced, a timer that was cancelled) produce no
//! effects and leave the state unchanged.  So does every event after
//! `Shutdown`.

use std::fmt;
use std::time::Duration;

use crate::application::transport::TransportError;

/// Delay between a failure and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(5000);

// ── Identifiers ───────────────────────────────────────────────────────────────

/// Identifies one connection attempt.  Ids increase monotonically per link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// Identifies one scheduled reconnect timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

// ── Phases, events, effects ───────────────────────────────────────────────────

/// Where the link is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPhase {
    /// Initial phase, nothing has been opened yet.
    Disconnected,
    /// A transport is being opened.
    Connecting,
    /// The transport is open; messages can be sent.
    Connected,
    /// The last transport failed or closed; a reconnect timer is armed.
    ReconnectPending,
    /// Torn down.  Terminal.
    Shutdown,
}

/// Why a connection stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The transport signalled an error.
    Error(TransportError),
    /// The transport closed, cleanly or not.
    Closed,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Error(err) => write!(f, "error: {err}"),
            FailureReason::Closed => f.write_str("closed"),
        }
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The link was started (mount).
    Activate,
    /// The transport of connection `id` is open.
    Opened(ConnectionId),
    /// A text frame arrived on connection `id`.
    Message(ConnectionId, String),
    /// Connection `id` failed or closed.
    Failed { id: ConnectionId, reason: FailureReason },
    /// The reconnect timer fired.
    ReconnectDue(TimerId),
    /// The link is being torn down (unmount).
    Teardown,
}

/// Side effects requested by a transition, to be executed in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open a new transport for connection `id`.
    OpenTransport(ConnectionId),
    /// Close the transport of connection `id`.
    CloseTransport(ConnectionId),
    /// Send `INIT_CONNECTION` without a payload on the current transport.
    SendInit,
    /// Publish the new value of `is_connected`.
    SetConnected(bool),
    /// Report why connection `id` stopped.
    LogFailure(ConnectionId, FailureReason),
    /// Cancel reconnect timer.
    CancelReconnect(TimerId),
    /// Arm reconnect timer, firing `ReconnectDue(timer)` after `delay`.
    ScheduleReconnect(TimerId, Duration),
    /// Hand an inbound text frame to the receive dispatcher.
    Dispatch(String),
}

// ── State ─────────────────────────────────────────────────────────────────────

/// Complete state of one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkState {
    phase: LinkPhase,
    /// Current connection attempt.  Kept while reconnecting so that a late
    /// `Closed` following an `Error` still counts as current.
    connection: Option<ConnectionId>,
    pending_timer: Option<TimerId>,
    next_connection: u64,
    next_timer: u64,
    reconnect_delay: Duration,
}

impl Default for LinkState {
    fn default() -> Self {
        Self::new(DEFAULT_RECONNECT_DELAY)
    }
}

impl LinkState {
    /// Creates a `Disconnected` link that waits `reconnect_delay` between
    /// attempts.
    pub fn new(reconnect_delay: Duration) -> Self {
        Self {
            phase: LinkPhase::Disconnected,
            connection: None,
            pending_timer: None,
            next_connection: 1,
            next_timer: 1,
            reconnect_delay,
        }
    }

    pub fn phase(&self) -> LinkPhase {
        self.phase
    }

    /// `true` only while the current transport is open.
    pub fn is_connected(&self) -> bool {
        self.phase == LinkPhase::Connected
    }

    pub fn connection(&self) -> Option<ConnectionId> {
        self.connection
    }

    pub fn pending_timer(&self) -> Option<TimerId> {
        self.pending_timer
    }

    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    fn is_current(&self, id: ConnectionId) -> bool {
        self.connection == Some(id)
    }

    fn allocate_connection(&mut self) -> ConnectionId {
        let id = ConnectionId(self.next_connection);
        self.next_connection += 1;
        id
    }

    fn allocate_timer(&mut self) -> TimerId {
        let id = TimerId(self.next_timer);
        self.next_timer += 1;
        id
    }
}

// ── Transition function ───────────────────────────────────────────────────────

/// Computes the next state and the effects of applying `event` to `state`.
///
/// # Examples
///
/// ```rust
/// use colorsync_client::application::link_state::{
///     transition, ConnectionId, Effect, LinkEvent, LinkPhase, LinkState,
/// };
///
/// let (state, effects) = transition(&LinkState::default(), LinkEvent::Activate);
/// assert_eq!(state.phase(), LinkPhase::Connecting);
/// assert_eq!(effects, vec![Effect::OpenTransport(ConnectionId(1))]);
/// ```
pub fn transition(state: &LinkState, event: LinkEvent) -> (LinkState, Vec<Effect>) {
    let mut next = state.clone();
    let mut effects = Vec::new();

    if next.phase == LinkPhase::Shutdown {
        return (next, effects);
    }

    match event {
        LinkEvent::Activate => {
            if next.phase == LinkPhase::Disconnected && next.connection.is_none() {
                let id = next.allocate_connection();
                next.connection = Some(id);
                next.phase = LinkPhase::Connecting;
                effects.push(Effect::OpenTransport(id));
            }
        }

        LinkEvent::Opened(id) => {
            if next.phase == LinkPhase::Connecting && next.is_current(id) {
                next.phase = LinkPhase::Connected;
                effects.push(Effect::SendInit);
                effects.push(Effect::SetConnected(true));
            }
        }

        LinkEvent::Message(id, text) => {
            if next.phase == LinkPhase::Connected && next.is_current(id) {
                effects.push(Effect::Dispatch(text));
            }
        }

        LinkEvent::Failed { id, reason } => {
            let live = matches!(
                next.phase,
                LinkPhase::Connecting | LinkPhase::Connected | LinkPhase::ReconnectPending
            );
            if live && next.is_current(id) {
                next.phase = LinkPhase::ReconnectPending;
                effects.push(Effect::LogFailure(id, reason));
                effects.push(Effect::SetConnected(false));
                if let Some(old) = next.pending_timer.take() {
                    effects.push(Effect::CancelReconnect(old));
                }
                let timer = next.allocate_timer();
                next.pending_timer = Some(timer);
                effects.push(Effect::ScheduleReconnect(timer, next.reconnect_delay));
            }
        }

        LinkEvent::ReconnectDue(timer) => {
            if next.phase == LinkPhase::ReconnectPending && next.pending_timer == Some(timer) {
                next.pending_timer = None;
                if let Some(old) = next.connection.take() {
                    effects.push(Effect::CloseTransport(old));
                }
                let id = next.allocate_connection();
                next.connection = Some(id);
                next.phase = LinkPhase::Connecting;
                effects.push(Effect::OpenTransport(id));
            }
        }

        LinkEvent::Teardown => {
            if let Some(timer) = next.pending_timer.take() {
                effects.push(Effect::CancelReconnect(timer));
            }
            if let Some(id) = next.connection.take() {
                effects.push(Effect::CloseTransport(id));
            }
            effects.push(Effect::SetConnected(false));
            next.phase = LinkPhase::Shutdown;
        }
    }

    (next, effects)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
