//! Port for the shared "current color" value.
//!
//! The display reads it, the link manager writes remote updates into it.
//! The store is passed in explicitly wherever it is needed; there is no
//! global instance.

/// Holder of the single color every view displays.
///
/// Colors are opaque strings (usually `#rrggbb` hex).  Implementations must
/// store exactly what they are given.
#[cfg_attr(test, mockall::automock)]
pub trait ColorStore: Send + Sync {
    /// Returns the color currently displayed.
    fn current_color(&self) -> String;

    /// Replaces the current color.
    fn set_current_color(&self, color: String);
}
