//! Application layer for the client.
//!
//! # What lives here?
//!
//! - **`link_state`** – The connection lifecycle as a pure function from
//!   `(state, event)` to `(new state, effects)`.  No I/O, no clock.
//!
//! - **`link_manager`** – The tokio task that owns a [`link_state::LinkState`],
//!   feeds it events, and carries out its effects (opening transports,
//!   arming the reconnect timer, writing messages).
//!
//! - **`dispatch`** – Decodes one inbound text frame and applies it to the
//!   color store.
//!
//! - **`color_store`** and **`transport`** – The ports the link manager talks
//!   to.  Implementations are injected from the infrastructure layer.

pub mod color_store;
pub mod dispatch;
pub mod link_manager;
pub mod link_state;
pub mod transport;
