//! Transport adapters.
//!
//! - [`websocket::WsConnector`] – real WebSocket connections.
//! - [`mock::MockConnector`] – in-memory connections driven by tests.

pub mod mock;
pub mod websocket;
