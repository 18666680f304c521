//! colorsync-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does colorsync-client do? (for beginners)
//!
//! Several users look at the same color.  When one of them picks a new color,
//! the client sends it to the colorsync server, the server broadcasts it to
//! every connected client, and each client updates what it displays.
//!
//! The interesting part is the **link manager**, which owns the WebSocket
//! connection to the server:
//!
//! 1. Opens the connection and sends `INIT_CONNECTION` once it is open.
//! 2. Sends `SET_COLOR` messages on behalf of the picker, each stamped with a
//!    fresh random `Authorization` token.
//! 3. Decodes every incoming message and writes `NEW_COLOR` values into the
//!    shared color store.
//! 4. When the connection fails or closes, waits a fixed delay (5 s by
//!    default) and opens a brand-new connection, forever, until shut down.
//!
//! The lifecycle rules live in a pure state machine
//! ([`application::link_state`]) so they can be tested without a network.

/// Application layer: link state machine, dispatch, and the ports it drives.
pub mod application;

/// Infrastructure layer: WebSocket transport, color store, and config files.
pub mod infrastructure;
