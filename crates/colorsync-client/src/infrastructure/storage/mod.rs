//! Persistent storage for client settings.

pub mod config;
