//! The shared color store.
//!
//! Backed by a `tokio::sync::watch` channel: the link manager writes remote
//! updates, and any number of displays hold a receiver and wake up when the
//! color changes.  Writing the color that is already current does not wake
//! anyone.

use tokio::sync::watch;

use crate::application::color_store::ColorStore;

/// Color shown before the server sent anything.
pub const DEFAULT_COLOR: &str = "#fff";

/// Current color plus change notification.
#[derive(Debug)]
pub struct ColorState {
    tx: watch::Sender<String>,
}

impl ColorState {
    pub fn new(initial: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(initial.into());
        Self { tx }
    }

    /// Returns a receiver that observes every color change.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.tx.subscribe()
    }
}

impl Default for ColorState {
    fn default() -> Self {
        Self::new(DEFAULT_COLOR)
    }
}

impl ColorStore for ColorState {
    fn current_color(&self) -> String {
        self.tx.borrow().clone()
    }

    fn set_current_color(&self, color: String) {
        self.tx.send_if_modified(|current| {
            if *current == color {
                return false;
            }
            *current = color;
            true
        });
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
