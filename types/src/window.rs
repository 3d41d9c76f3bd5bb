//! Browser window seam.
//!
//! The host environment opens child browsing contexts through
//! [`WindowOpener`]. A window reference may go stale at any time (the user
//! closed it, the page navigated away), so every query is fallible.

use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("window reference is no longer valid")]
    Stale,

    #[error("window operation denied: {0}")]
    Denied(String),
}

/// A reference to an open child browsing context.
pub trait ChildWindow: Send + Sync {
    /// Whether the window has been closed.
    fn is_closed(&self) -> Result<bool, WindowError>;

    /// Close the window.
    fn close(&self) -> Result<(), WindowError>;
}

/// Opens child browsing contexts.
pub trait WindowOpener: Send + Sync {
    /// Open `url` in a new child window.
    ///
    /// Returns `None` when the browser blocked the popup.
    fn open(&self, url: &Url) -> Option<Box<dyn ChildWindow>>;
}
