//! Receive dispatch: one inbound text frame in, at most one store write out.
//!
//! | action      | effect                                              |
//! |-------------|-----------------------------------------------------|
//! | `NEW_COLOR` | payload string written verbatim to the color store  |
//! | `ERROR`     | `appDomain.errorCode` logged, nothing else          |
//! | other       | warning logged, nothing else                        |
//!
//! Frames that do not decode are logged and dropped; they never stop the
//! link.  Because a color update is a plain overwrite, dispatching the same
//! frame twice leaves the store exactly as dispatching it once.

use colorsync_core::{decode_inbound, ActionKind, ErrorPayload};
use tracing::{debug, error, warn};

use crate::application::color_store::ColorStore;

/// What dispatching a frame did.  Returned for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The store now holds this color.
    ColorApplied(String),
    /// The server reported an application error.
    RemoteError(ErrorPayload),
    /// The frame was valid but had no effect; holds the action string.
    Ignored(String),
    /// The frame did not decode.
    Malformed,
}

/// Decodes `text` and applies it to `store`.
pub fn dispatch_inbound<S: ColorStore + ?Sized>(text: &str, store: &S) -> DispatchOutcome {
    let msg = match decode_inbound(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("dropping inbound frame: {e}");
            return DispatchOutcome::Malformed;
        }
    };
    debug!(action = %msg.action, "inbound message");

    match msg.action.known() {
        Some(ActionKind::NewColor) => match msg.color() {
            Some(color) => {
                store.set_current_color(color.to_string());
                DispatchOutcome::ColorApplied(color.to_string())
            }
            None => {
                warn!("NEW_COLOR without a color string: {:?}", msg.payload);
                DispatchOutcome::Ignored(msg.action.to_string())
            }
        },
        Some(ActionKind::Error) => match msg.error() {
            Some(err) => {
                error!("server reported {err}");
                DispatchOutcome::RemoteError(err.clone())
            }
            None => {
                warn!("ERROR without error details: {:?}", msg.payload);
                DispatchOutcome::Ignored(msg.action.to_string())
            }
        },
        _ => {
            warn!("unhandled action: {}", msg.action);
            DispatchOutcome::Ignored(msg.action.to_string())
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
