//! Infrastructure layer for colorsync-server.
//!
//! All I/O lives here: the TCP listener, the WebSocket handshake, the
//! per-session reader/writer tasks and the [`hub::Hub`] that connects them.
//!
//! # What does NOT belong here?
//!
//! - Deciding how to answer a client frame (that is the application layer)
//! - Configuration parsing (that is done in `main.rs`)

pub mod hub;
pub mod ws_server;

pub use ws_server::{run_server, serve};
