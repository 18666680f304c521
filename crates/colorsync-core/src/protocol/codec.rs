//! JSON codec for colorsync protocol messages.
//!
//! Each message is a single JSON object carried in one WebSocket text frame,
//! so there is no length prefix and no streaming buffer: one frame in, one
//! message out.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::protocol::messages::{InboundMessage, OutboundMessage};

/// Errors that can occur during message encoding or decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The message could not be serialized to JSON.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    /// The text frame is not valid JSON or does not have the envelope shape.
    #[error("malformed message: {0}")]
    Decode(#[source] serde_json::Error),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes any protocol message into the JSON text sent in a WebSocket frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialization fails (only possible for
/// payload types whose `Serialize` impl can fail, e.g. maps with non-string
/// keys).
///
/// # Examples
///
/// ```rust
/// use colorsync_core::{encode_message, ActionKind, InboundMessage};
///
/// let msg = InboundMessage::new(ActionKind::NewColor, "#ff0000".to_string());
/// let text = encode_message(&msg).unwrap();
/// assert_eq!(text, r##"{"action":"NEW_COLOR","payload":"#ff0000"}"##);
/// ```
pub fn encode_message<M: Serialize>(msg: &M) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(ProtocolError::Encode)
}

/// Decodes one message of type `M` from a text frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Decode`] if the text is not valid JSON or does not
/// match the shape of `M`.
pub fn decode_message<M: DeserializeOwned>(text: &str) -> Result<M, ProtocolError> {
    serde_json::from_str(text).map_err(ProtocolError::Decode)
}

/// Decodes a server → client frame into the typed [`InboundMessage`].
///
/// # Errors
///
/// Returns [`ProtocolError::Decode`] for malformed frames.
///
/// # Examples
///
/// ```rust
/// use colorsync_core::{decode_inbound, ActionKind};
///
/// let msg = decode_inbound(r##"{"action":"NEW_COLOR","payload":"#112233"}"##).unwrap();
/// assert_eq!(msg.action.known(), Some(ActionKind::NewColor));
/// assert_eq!(msg.color(), Some("#112233"));
/// ```
pub fn decode_inbound(text: &str) -> Result<InboundMessage, ProtocolError> {
    decode_message(text)
}

/// Decodes a client → server frame, keeping the payload as raw JSON.
///
/// # Errors
///
/// Returns [`ProtocolError::Decode`] for malformed frames, including frames
/// without an `Authorization` token.
pub fn decode_outbound(text: &str) -> Result<OutboundMessage, ProtocolError> {
    decode_message(text)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
