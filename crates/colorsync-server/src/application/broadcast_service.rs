//! Handling of client → server frames.
//!
//! | Client action      | Server reaction                                          |
//! |--------------------|----------------------------------------------------------|
//! | `INIT_CONNECTION`  | remember the token, reply `{"action":"MESSAGE","payload":"OK"}` |
//! | `SET_COLOR`        | send `NEW_COLOR` with the same payload to every client   |
//! | anything else      | reply `ERROR` with `{"appDomain":"WS","errorCode":404}`  |
//!
//! Payloads are forwarded verbatim: the server does not check that a color
//! looks like a color.  Missing `Authorization` or `action` keys are read as
//! empty strings, so only frames that are not JSON objects end a session.

use colorsync_core::protocol::decode_message;
use colorsync_core::{
    encode_message, ActionKind, ErrorPayload, InboundMessage, ProtocolError,
    WireAction, ACK_ACTION, ACK_PAYLOAD,
};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// `appDomain` used for errors raised by the WebSocket layer.
pub const WS_ERROR_DOMAIN: &str = "WS";

/// `errorCode` sent back for an action the server does not handle.
pub const UNKNOWN_ACTION_CODE: i64 = 404;

/// A client frame as the server reads it.
///
/// More lenient than [`colorsync_core::OutboundMessage`]: a frame without a
/// token still counts (the token is empty), and a frame without an action
/// is answered like any other unknown action.
#[derive(Debug, Deserialize)]
struct ClientFrame {
    #[serde(rename = "Authorization", alias = "authorization", default)]
    authorization: String,
    #[serde(default = "missing_action")]
    action: WireAction,
    payload: Option<Value>,
}

fn missing_action() -> WireAction {
    WireAction::Other(String::new())
}

/// Errors that can occur while handling one client frame.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The frame is not a well-formed client message.  Ends the session.
    #[error("malformed client message")]
    Decode(#[source] ProtocolError),

    /// A reply could not be serialized.
    #[error("failed to encode reply")]
    Encode(#[source] ProtocolError),
}

/// What the session has to do after one client frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The client introduced itself: remember `token`, then send `reply` to
    /// this client only.
    Identify { token: String, reply: String },
    /// Send the frame to this client only.
    Reply(String),
    /// Send the frame to every connected client, the sender included.
    Broadcast(String),
}

/// Decides the server's reaction to one text frame from a client.
///
/// # Errors
///
/// Returns [`ServerError::Decode`] when `text` is not a client message.  The
/// caller is expected to end the session in that case.
///
/// # Example
///
/// ```rust
/// use colorsync_server::application::{handle_client_message, Outcome};
///
/// let frame = r##"{"Authorization":"abc","action":"SET_COLOR","payload":"#00ff00"}"##;
/// let outcome = handle_client_message(frame).unwrap();
/// assert_eq!(
///     outcome,
///     Outcome::Broadcast(r##"{"action":"NEW_COLOR","payload":"#00ff00"}"##.to_string())
/// );
/// ```
pub fn handle_client_message(text: &str) -> Result<Outcome, ServerError> {
    let msg: ClientFrame = decode_message(text).map_err(ServerError::Decode)?;
    debug!("client → server: {}", msg.action);

    match msg.action.known() {
        Some(ActionKind::Init) => Ok(Outcome::Identify {
            token: msg.authorization,
            reply: acknowledgement()?,
        }),
        Some(ActionKind::SetColor) => {
            let broadcast = InboundMessage::<Value> {
                action: WireAction::Known(ActionKind::NewColor),
                payload: msg.payload,
            };
            Ok(Outcome::Broadcast(
                encode_message(&broadcast).map_err(ServerError::Encode)?,
            ))
        }
        _ => {
            warn!("no such action: {}", msg.action);
            Ok(Outcome::Reply(unknown_action_error()?))
        }
    }
}

/// The `MESSAGE` / `OK` reply to `INIT_CONNECTION`.
fn acknowledgement() -> Result<String, ServerError> {
    let ack = InboundMessage {
        action: WireAction::Other(ACK_ACTION.to_string()),
        payload: Some(Value::String(ACK_PAYLOAD.to_string())),
    };
    encode_message(&ack).map_err(ServerError::Encode)
}

fn unknown_action_error() -> Result<String, ServerError> {
    let err = InboundMessage::new(
        ActionKind::Error,
        ErrorPayload {
            app_domain: WS_ERROR_DOMAIN.to_string(),
            error_code: UNKNOWN_ACTION_CODE,
        },
    );
    encode_message(&err).map_err(ServerError::Encode)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
