//! colorsync-server library crate.
//!
//! A small broadcast server: every client connected to `/ws/v1/websocket`
//! can set the shared color, and every client (the sender included) is told
//! about it.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! clients (JSON over WebSocket)
//!         ↕
//! [colorsync-server]
//!   ├── domain/           ServerConfig
//!   ├── application/      What to answer: ack, broadcast or ERROR 404
//!   └── infrastructure/
//!         ├── ws_server/  Accept loop, reader and writer tasks
//!         └── hub/        Connected clients and their egress channels
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` depends on `domain` and `colorsync-core` only.
//! - `infrastructure` depends on all other layers plus `tokio` and
//!   `tokio-tungstenite`.

/// Domain layer: configuration types (no I/O).
pub mod domain;

/// Application layer: client message handling.
pub mod application;

/// Infrastructure layer: WebSocket server and client registry.
pub mod infrastructure;
