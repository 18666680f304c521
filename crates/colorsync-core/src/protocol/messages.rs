//! All colorsync protocol message types.
//!
//! Every frame on the wire is a UTF-8 JSON object carried in a WebSocket text
//! message.  There are two envelope shapes, named from the client's point of
//! view:
//!
//! ```text
//! Client → Server (OutboundMessage):
//!   {"Authorization":"<uuid v4>","action":"SET_COLOR","payload":"#112233"}
//!
//! Server → Client (InboundMessage):
//!   {"action":"NEW_COLOR","payload":"#112233"}
//!   {"action":"ERROR","payload":{"appDomain":"WS","errorCode":404}}
//! ```
//!
//! The `action` field decides how `payload` is interpreted.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Protocol constants ────────────────────────────────────────────────────────

/// The endpoint clients connect to when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8080/ws/v1/websocket";

/// The HTTP path on which the server accepts WebSocket upgrades.
pub const WEBSOCKET_PATH: &str = "/ws/v1/websocket";

/// Action string the server uses to acknowledge `INIT_CONNECTION`.
///
/// It is not part of [`ActionKind`]: clients receive it as an unrecognized
/// action and only log it.
pub const ACK_ACTION: &str = "MESSAGE";

/// Payload carried by the acknowledgement of `INIT_CONNECTION`.
pub const ACK_PAYLOAD: &str = "OK";

// ── Actions ───────────────────────────────────────────────────────────────────

/// The closed set of actions a client understands.
///
/// Serialized as the upper-snake-case strings used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Sent by the client once per successful connection, without a payload.
    #[serde(rename = "INIT_CONNECTION")]
    Init,
    /// Sent by the client when the user picks a new color.
    #[serde(rename = "SET_COLOR")]
    SetColor,
    /// Broadcast by the server with the color every client should display.
    #[serde(rename = "NEW_COLOR")]
    NewColor,
    /// Sent by the server when it rejected a request.
    #[serde(rename = "ERROR")]
    Error,
}

impl ActionKind {
    /// Every action, in declaration order.
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Init,
        ActionKind::SetColor,
        ActionKind::NewColor,
        ActionKind::Error,
    ];

    /// Returns the string used for this action on the wire.
    pub const fn as_wire_str(self) -> &'static str {
        match self {
            ActionKind::Init => "INIT_CONNECTION",
            ActionKind::SetColor => "SET_COLOR",
            ActionKind::NewColor => "NEW_COLOR",
            ActionKind::Error => "ERROR",
        }
    }

    /// Looks up an action by its wire string.  Matching is exact.
    pub fn from_wire_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_wire_str() == s)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire_str())
    }
}

/// The `action` field as it appears in a decoded frame.
///
/// Peers may send actions outside [`ActionKind`] (the server's `MESSAGE`
/// acknowledgement, or anything a newer peer invents).  Those decode into
/// [`WireAction::Other`] instead of failing the whole frame, so the receiver
/// can decide how to react.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireAction {
    /// One of the actions in the closed vocabulary.
    Known(ActionKind),
    /// Any other action string, kept verbatim.
    Other(String),
}

impl WireAction {
    /// Returns the known action, if this is one.
    pub fn known(&self) -> Option<ActionKind> {
        match self {
            WireAction::Known(kind) => Some(*kind),
            WireAction::Other(_) => None,
        }
    }

    /// Returns the action exactly as it is spelled on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            WireAction::Known(kind) => kind.as_wire_str(),
            WireAction::Other(raw) => raw,
        }
    }
}

impl From<ActionKind> for WireAction {
    fn from(kind: ActionKind) -> Self {
        WireAction::Known(kind)
    }
}

impl fmt::Display for WireAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Client → Server ───────────────────────────────────────────────────────────

/// A message written by a client.
///
/// `authorization` is a fresh UUID v4 per message: a nonce, not a session
/// credential.  `payload` is omitted from the JSON when absent.
///
/// # Serde representation
///
/// ```json
/// {"Authorization":"0f8fad5b-d9cb-469f-a165-70867728950e","action":"INIT_CONNECTION"}
/// {"Authorization":"7c9e6679-7425-40de-944b-e07fc1f90ae7","action":"SET_COLOR","payload":"#ff0000"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage<T = serde_json::Value> {
    /// Per-message random token.
    // Older servers spelled the key in lower case; accept both when decoding.
    #[serde(rename = "Authorization", alias = "authorization")]
    pub authorization: String,

    /// What the client wants the server to do.
    pub action: WireAction,

    /// Action-specific data.  A missing key decodes as `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<T>,
}

impl<T> OutboundMessage<T> {
    /// Builds a message for `action` with a freshly generated token.
    ///
    /// # Example
    ///
    /// ```rust
    /// use colorsync_core::{ActionKind, OutboundMessage};
    ///
    /// let a = OutboundMessage::new(ActionKind::SetColor, Some("#fff".to_string()));
    /// let b = OutboundMessage::new(ActionKind::SetColor, Some("#fff".to_string()));
    /// assert_ne!(a.authorization, b.authorization);
    /// ```
    pub fn new(action: ActionKind, payload: Option<T>) -> Self {
        Self {
            authorization: Uuid::new_v4().to_string(),
            action: WireAction::Known(action),
            payload,
        }
    }
}

// ── Server → Client ───────────────────────────────────────────────────────────

/// A message written by the server.
///
/// The payload type is generic so the server can forward arbitrary JSON
/// (`InboundMessage<serde_json::Value>`) while clients decode into the typed
/// [`InboundPayload`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage<P = InboundPayload> {
    /// Determines how `payload` must be read.
    pub action: WireAction,

    /// Action-specific data.  A missing key decodes as `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<P>,
}

impl<P> InboundMessage<P> {
    /// Builds a message for one of the known actions.
    pub fn new(action: ActionKind, payload: P) -> Self {
        Self {
            action: WireAction::Known(action),
            payload: Some(payload),
        }
    }
}

impl InboundMessage {
    /// Returns the color carried by a `NEW_COLOR` payload, if the payload is
    /// a string.
    pub fn color(&self) -> Option<&str> {
        match &self.payload {
            Some(InboundPayload::Text(color)) => Some(color),
            _ => None,
        }
    }

    /// Returns the error details carried by an `ERROR` payload.
    pub fn error(&self) -> Option<&ErrorPayload> {
        match &self.payload {
            Some(InboundPayload::Error(err)) => Some(err),
            _ => None,
        }
    }
}

/// Every payload shape a client knows how to read.
///
/// Variants are tried in declaration order, so a JSON string always becomes
/// [`InboundPayload::Text`] and an object with `appDomain`/`errorCode` always
/// becomes [`InboundPayload::Error`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InboundPayload {
    /// Plain string, e.g. a color (`"#ff0000"`) or the `"OK"` acknowledgement.
    Text(String),
    /// Application error reported by the server.
    Error(ErrorPayload),
    /// Notification about an uploaded file.  Decoded, never acted upon.
    FileUploaded(FileUploadedPayload),
    /// Any other JSON value.
    Other(serde_json::Value),
}

/// Details of an application-level error reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    /// Which part of the server raised the error (e.g. `"WS"`, `"auth"`).
    pub app_domain: String,
    /// Numeric code, HTTP-like by convention (`404` for an unknown action).
    pub error_code: i64,
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app_domain, self.error_code)
    }
}

/// Payload describing an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUploadedPayload {
    /// The kind of file.
    #[serde(rename = "type")]
    pub kind: String,
    /// Server-side identifier of the upload.
    #[serde(default)]
    pub identifier: String,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_kind_wire_strings_match_protocol() {
        assert_eq!(ActionKind::Init.as_wire_str(), "INIT_CONNECTION");
        assert_eq!(ActionKind::SetColor.as_wire_str(), "SET_COLOR");
        assert_eq!(ActionKind::NewColor.as_wire_str(), "NEW_COLOR");
        assert_eq!(ActionKind::Error.as_wire_str(), "ERROR");
    }

    #[test]
    fn test_action_kind_serde_agrees_with_as_wire_str() {
        // The serde renames and `as_wire_str` must never drift apart.
        for kind in ActionKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_wire_str()));
        }
    }

    #[test]
    fn test_from_wire_str_is_case_sensitive() {
        assert_eq!(ActionKind::from_wire_str("NEW_COLOR"), Some(ActionKind::NewColor));
        assert_eq!(ActionKind::from_wire_str("new_color"), None);
        assert_eq!(ActionKind::from_wire_str("MESSAGE"), None);
    }

    #[test]
    fn test_wire_action_keeps_unknown_strings() {
        // Arrange
        let json = r#""FILE_UPLOADED""#;

        // Act
        let action: WireAction = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(action, WireAction::Other("FILE_UPLOADED".to_string()));
        assert_eq!(action.known(), None);
        assert_eq!(action.as_str(), "FILE_UPLOADED");
    }

    #[test]
    fn test_wire_action_prefers_known_variant() {
        let action: WireAction = serde_json::from_str(r#""SET_COLOR""#).unwrap();
        assert_eq!(action.known(), Some(ActionKind::SetColor));
    }

    #[test]
    fn test_outbound_new_generates_uuid_v4_token() {
        // Arrange / Act
        let msg: OutboundMessage<String> = OutboundMessage::new(ActionKind::Init, None);

        // Assert
        let token = Uuid::parse_str(&msg.authorization).expect("token must be a UUID");
        assert_eq!(token.get_version_num(), 4);
    }

    #[test]
    fn test_outbound_tokens_are_unique_per_message() {
        let tokens: std::collections::HashSet<String> = (0..100)
            .map(|_| OutboundMessage::<String>::new(ActionKind::SetColor, None).authorization)
            .collect();
        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn test_outbound_uses_capitalised_authorization_key() {
        let msg = OutboundMessage::new(ActionKind::SetColor, Some("#000".to_string()));
        let json = serde_json::to_value(&msg).unwrap();

        assert!(json.get("Authorization").is_some());
        assert!(json.get("authorization").is_none());
        assert_eq!(json["action"], "SET_COLOR");
        assert_eq!(json["payload"], "#000");
    }

    #[test]
    fn test_outbound_without_payload_omits_the_key() {
        let msg: OutboundMessage<String> = OutboundMessage::new(ActionKind::Init, None);
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("payload").is_none(), "absent payload must not be serialized");
    }

    #[test]
    fn test_outbound_accepts_lowercase_authorization_key() {
        let json = r##"{"authorization":"abc","action":"SET_COLOR","payload":"#123"}"##;
        let msg: OutboundMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.authorization, "abc");
    }

    #[test]
    fn test_inbound_string_payload_is_text() {
        let msg: InboundMessage =
            serde_json::from_str(r##"{"action":"NEW_COLOR","payload":"#ff0000"}"##).unwrap();
        assert_eq!(msg.action.known(), Some(ActionKind::NewColor));
        assert_eq!(msg.color(), Some("#ff0000"));
        assert_eq!(msg.error(), None);
    }

    #[test]
    fn test_inbound_error_payload_is_parsed() {
        let msg: InboundMessage = serde_json::from_str(
            r#"{"action":"ERROR","payload":{"appDomain":"auth","errorCode":401}}"#,
        )
        .unwrap();

        let err = msg.error().expect("must be an error payload");
        assert_eq!(err.app_domain, "auth");
        assert_eq!(err.error_code, 401);
        assert_eq!(err.to_string(), "auth.401");
    }

    #[test]
    fn test_inbound_file_uploaded_payload_is_parsed() {
        let msg: InboundMessage = serde_json::from_str(
            r#"{"action":"FILE_UPLOADED","payload":{"type":"image","identifier":"42"}}"#,
        )
        .unwrap();

        assert_eq!(
            msg.payload,
            Some(InboundPayload::FileUploaded(FileUploadedPayload {
                kind: "image".to_string(),
                identifier: "42".to_string(),
            }))
        );
    }

    #[test]
    fn test_inbound_unexpected_payload_falls_back_to_other() {
        let msg: InboundMessage =
            serde_json::from_str(r#"{"action":"NEW_COLOR","payload":[1,2,3]}"#).unwrap();
        assert!(matches!(msg.payload, Some(InboundPayload::Other(_))));
        assert_eq!(msg.color(), None);
    }

    #[test]
    fn test_inbound_missing_payload_is_none() {
        let msg: InboundMessage = serde_json::from_str(r#"{"action":"MESSAGE"}"#).unwrap();
        assert_eq!(msg.payload, None);
        assert_eq!(msg.action.as_str(), ACK_ACTION);
    }

    #[test]
    fn test_payload_types_without_default_decode_when_key_is_missing() {
        // Arrange: neither payload type implements `Default`.
        let inbound = r#"{"action":"ERROR"}"#;
        let outbound = r#"{"Authorization":"t","action":"ERROR"}"#;

        // Act
        let inbound: InboundMessage<ErrorPayload> = serde_json::from_str(inbound).unwrap();
        let outbound: OutboundMessage<FileUploadedPayload> =
            serde_json::from_str(outbound).unwrap();

        // Assert
        assert_eq!(inbound.payload, None);
        assert_eq!(outbound.payload, None);
    }

    #[test]
    fn test_default_endpoint_uses_websocket_path() {
        assert!(DEFAULT_ENDPOINT.ends_with(WEBSOCKET_PATH));
    }
}
