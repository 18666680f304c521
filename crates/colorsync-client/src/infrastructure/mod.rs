//! Infrastructure layer for the client application.
//!
//! Contains the adapters behind the application-layer ports.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `colorsync_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`transport`** – The tokio-tungstenite WebSocket connector used in
//!   production, plus a `MockConnector` that lets tests play the server by
//!   hand.
//!
//! - **`color_state`** – The shared color store, backed by a
//!   `tokio::sync::watch` channel so displays can wait for changes.
//!
//! - **`storage`** – TOML configuration file for the client binary.

pub mod color_state;
pub mod storage;
pub mod transport;
