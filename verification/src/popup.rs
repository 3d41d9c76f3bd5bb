//! Popup lifecycle: open the provider page, watch for the user closing it,
//! close it safely.
//!
//! A handle moves `open → closed` exactly once and is never reopened; a new
//! attempt opens a new handle.

use ekyc_types::{ChildWindow, WindowOpener};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopupState {
    Open,
    Closed,
}

/// Owned reference to an open verification window plus the timer that
/// watches it for user-initiated closure.
pub struct PopupHandle {
    window: Arc<dyn ChildWindow>,
    watcher: Option<JoinHandle<()>>,
    state: PopupState,
}

impl PopupHandle {
    pub fn state(&self) -> PopupState {
        self.state
    }

    /// Closed by us, closed by the user, or no longer reachable.
    pub fn is_closed(&self) -> bool {
        self.state == PopupState::Closed || self.window.is_closed().unwrap_or(true)
    }

    /// Whether the closure watcher is still running.
    pub fn is_watching(&self) -> bool {
        self.watcher.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Clear the closure watcher without touching the window.
    pub fn stop_watching(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
    }

    /// Close the window and clear the watcher.
    ///
    /// Idempotent and infallible. Returns `true` only for the call that
    /// actually closed an open window.
    pub fn close_safely(&mut self) -> bool {
        // Watcher first, so our own close is never reported as the user's.
        self.stop_watching();
        if self.state == PopupState::Closed {
            return false;
        }
        self.state = PopupState::Closed;
        if self.window.is_closed().unwrap_or(true) {
            return false;
        }
        if let Err(e) = self.window.close() {
            debug!(error = %e, "popup close ignored");
        }
        true
    }
}

impl Drop for PopupHandle {
    fn drop(&mut self) {
        self.close_safely();
    }
}

/// Opens verification windows and owns their closure watchers.
pub struct PopupController {
    opener: Arc<dyn WindowOpener>,
    check_interval: Duration,
}

impl PopupController {
    pub fn new(opener: Arc<dyn WindowOpener>, check_interval: Duration) -> Self {
        Self {
            opener,
            check_interval,
        }
    }

    /// Open `url` in a child window.
    ///
    /// `on_user_close` runs at most once, from the watcher task, when the
    /// window is found closed (or unreachable) without [`PopupHandle::close_safely`]
    /// having been called. Returns `None` if the browser blocked the popup.
    pub fn open<F>(&self, url: &Url, on_user_close: F) -> Option<PopupHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        let Some(window) = self.opener.open(url) else {
            warn!(%url, "verification popup blocked by browser");
            return None;
        };
        let window: Arc<dyn ChildWindow> = Arc::from(window);

        let watched = window.clone();
        let interval = self.check_interval;
        let watcher = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if watched.is_closed().unwrap_or(true) {
                    info!("verification popup closed by user");
                    on_user_close();
                    break;
                }
            }
        });

        info!(%url, "verification popup opened");
        Some(PopupHandle {
            window,
            watcher: Some(watcher),
            state: PopupState::Open,
        })
    }

    /// Close an optional handle. Safe on `None` and on closed or stale handles.
    pub fn close_safely(handle: Option<&mut PopupHandle>) -> bool {
        handle.map(PopupHandle::close_safely).unwrap_or(false)
    }

    /// Whether an optional handle is closed. `None` counts as closed.
    pub fn is_closed(handle: Option<&PopupHandle>) -> bool {
        handle.map(PopupHandle::is_closed).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ekyc_nullables::NullBrowser;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn url() -> Url {
        Url::parse("https://kyc.test/flow/1").unwrap()
    }

    fn controller(browser: Arc<NullBrowser>) -> PopupController {
        PopupController::new(browser, Duration::from_millis(500))
    }

    #[tokio::test(start_paused = true)]
    async fn blocked_popup_returns_none() {
        let browser = Arc::new(NullBrowser::new());
        browser.block_popups(true);
        assert!(controller(browser).open(&url(), || {}).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn close_safely_is_idempotent() {
        let browser = Arc::new(NullBrowser::new());
        let mut handle = controller(browser.clone()).open(&url(), || {}).unwrap();
        let probe = browser.last_window().unwrap();

        assert!(handle.close_safely());
        assert!(!handle.close_safely());
        assert!(!PopupController::close_safely(Some(&mut handle)));
        assert!(!PopupController::close_safely(None));

        assert_eq!(probe.close_calls(), 1);
        assert!(!probe.is_open());
        assert_eq!(handle.state(), PopupState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_handle_reads_closed_and_closes_quietly() {
        let browser = Arc::new(NullBrowser::new());
        let mut handle = controller(browser.clone()).open(&url(), || {}).unwrap();
        browser.last_window().unwrap().make_stale();

        assert!(handle.is_closed());
        assert!(!handle.close_safely());
        assert_eq!(handle.state(), PopupState::Closed);
        assert!(PopupController::is_closed(None));
    }

    #[tokio::test(start_paused = true)]
    async fn closing_a_user_closed_window_has_no_effect() {
        let browser = Arc::new(NullBrowser::new());
        let mut handle = controller(browser.clone()).open(&url(), || {}).unwrap();
        let probe = browser.last_window().unwrap();
        probe.user_close();

        assert!(!handle.close_safely());
        assert_eq!(probe.close_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn watcher_reports_user_close_once() {
        let browser = Arc::new(NullBrowser::new());
        let reports = Arc::new(AtomicU32::new(0));
        let counter = reports.clone();
        let handle = controller(browser.clone())
            .open(&url(), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        browser.last_window().unwrap().user_close();
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(reports.load(Ordering::SeqCst), 1);
        assert!(handle.is_closed());
        assert!(!handle.is_watching());
    }

    #[tokio::test(start_paused = true)]
    async fn our_own_close_is_not_reported() {
        let browser = Arc::new(NullBrowser::new());
        let reports = Arc::new(AtomicU32::new(0));
        let counter = reports.clone();
        let mut handle = controller(browser)
            .open(&url(), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        handle.close_safely();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(reports.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_closes_window() {
        let browser = Arc::new(NullBrowser::new());
        let handle = controller(browser.clone()).open(&url(), || {}).unwrap();
        drop(handle);
        assert_eq!(browser.open_count(), 0);
    }
}
