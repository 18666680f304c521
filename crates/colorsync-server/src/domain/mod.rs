//! Domain layer for colorsync-server.
//!
//! Pure types with no I/O: currently only the runtime configuration.  The
//! wire messages themselves live in `colorsync-core`, shared with the client.

pub mod config;

pub use config::ServerConfig;
