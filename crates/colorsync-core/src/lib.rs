//! # colorsync-core
//!
//! Shared library for colorsync containing the wire protocol: the action
//! vocabulary, the message envelopes exchanged in both directions, and the
//! JSON codec that turns them into WebSocket text frames.
//!
//! This crate is used by both the client (the link manager) and the broadcast
//! server.  It has no dependencies on async runtimes, sockets, or UI code.
//!
//! # Architecture overview (for beginners)
//!
//! colorsync keeps a single "current color" in sync between every connected
//! client.  A client sends `SET_COLOR` when the user picks a color; the server
//! broadcasts `NEW_COLOR` to every client; each client writes the value into
//! its local color state.
//!
//! ```text
//! client ──{"Authorization":"<uuid>","action":"SET_COLOR","payload":"#ff0000"}──▶ server
//! client ◀──────────────{"action":"NEW_COLOR","payload":"#ff0000"}────────────── server
//! ```
//!
//! - **`protocol::messages`** – the typed envelopes and payloads.
//! - **`protocol::codec`** – encoding to and decoding from JSON text.

pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `colorsync_core::ActionKind` instead of the full module path.
pub use protocol::codec::{decode_inbound, decode_outbound, encode_message, ProtocolError};
pub use protocol::messages::{
    ActionKind, ErrorPayload, FileUploadedPayload, InboundMessage, InboundPayload,
    OutboundMessage, WireAction, ACK_ACTION, ACK_PAYLOAD, DEFAULT_ENDPOINT, WEBSOCKET_PATH,
};
