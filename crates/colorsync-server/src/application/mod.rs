//! Application layer for colorsync-server.
//!
//! Decides what the server answers to each client frame.  It knows *what* to
//! send and to *whom* (the sender only, or every client), but never touches a
//! socket: delivery is the infrastructure layer's job.
//!
//! # What does NOT belong here?
//!
//! - Accepting connections or WebSocket framing (infrastructure)
//! - Keeping the list of connected clients (infrastructure `hub`)
//! - Tokio task spawning

pub mod broadcast_service;

pub use broadcast_service::{handle_client_message, Outcome, ServerError};
