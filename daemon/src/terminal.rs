//! A terminal stand-in for the browser popup.
//!
//! "Opening" a window prints the provider link for the user to open in a
//! real browser. The user closing the window is simulated with Ctrl-C via
//! [`TerminalOpener::interrupt`].

use ekyc_types::{ChildWindow, WindowError, WindowOpener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use url::Url;

pub struct TerminalWindow {
    closed: Arc<AtomicBool>,
}

impl ChildWindow for TerminalWindow {
    fn is_closed(&self) -> Result<bool, WindowError> {
        Ok(self.closed.load(Ordering::SeqCst))
    }

    fn close(&self) -> Result<(), WindowError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            println!("Verification window closed.");
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct TerminalOpener {
    current: Mutex<Option<Arc<AtomicBool>>>,
}

impl TerminalOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the most recently opened window as closed by the user.
    /// Returns false when there is no open window.
    pub fn close_current(&self) -> bool {
        let current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        match current.as_ref() {
            Some(flag) => !flag.swap(true, Ordering::SeqCst),
            None => false,
        }
    }

    /// Handle one Ctrl-C: close the open window, or when none is open
    /// (the session is still being created) wake whoever waits on `abort`.
    pub fn interrupt(&self, abort: &Notify) {
        if !self.close_current() {
            abort.notify_one();
        }
    }
}

impl WindowOpener for TerminalOpener {
    fn open(&self, url: &Url) -> Option<Box<dyn ChildWindow>> {
        let closed = Arc::new(AtomicBool::new(false));
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Some(closed.clone());
        println!();
        println!("Open this link to verify your identity:");
        println!("  {url}");
        println!("Press Ctrl-C to close the verification window.");
        Some(Box::new(TerminalWindow { closed }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("http://127.0.0.1:7090/verify/abc").unwrap()
    }

    #[test]
    fn opened_window_starts_open() {
        let opener = TerminalOpener::new();
        let window = opener.open(&url()).unwrap();
        assert_eq!(window.is_closed(), Ok(false));
    }

    #[test]
    fn close_current_marks_latest_window() {
        let opener = TerminalOpener::new();
        let first = opener.open(&url()).unwrap();
        let second = opener.open(&url()).unwrap();

        assert!(opener.close_current());
        assert_eq!(second.is_closed(), Ok(true));
        assert_eq!(first.is_closed(), Ok(false));
        assert!(!opener.close_current());
    }

    #[test]
    fn close_current_without_window_is_noop() {
        assert!(!TerminalOpener::new().close_current());
    }

    #[test]
    fn closing_is_idempotent() {
        let opener = TerminalOpener::new();
        let window = opener.open(&url()).unwrap();
        window.close().unwrap();
        window.close().unwrap();
        assert_eq!(window.is_closed(), Ok(true));
    }

    #[tokio::test]
    async fn interrupt_without_window_requests_abort() {
        let opener = TerminalOpener::new();
        let abort = Notify::new();
        opener.interrupt(&abort);
        tokio::time::timeout(std::time::Duration::from_secs(1), abort.notified())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn interrupt_with_open_window_closes_it_instead() {
        let opener = TerminalOpener::new();
        let window = opener.open(&url()).unwrap();
        let abort = Notify::new();

        opener.interrupt(&abort);
        assert_eq!(window.is_closed(), Ok(true));

        let waited =
            tokio::time::timeout(std::time::Duration::from_millis(50), abort.notified()).await;
        assert!(waited.is_err());

        // A second Ctrl-C with the window already closed still gets through.
        opener.interrupt(&abort);
        tokio::time::timeout(std::time::Duration::from_secs(1), abort.notified())
            .await
            .unwrap();
    }
}
