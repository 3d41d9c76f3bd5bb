//! Nullable browser: popup windows controlled by the test.

use ekyc_types::{ChildWindow, WindowError, WindowOpener};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

#[derive(Default)]
struct WindowState {
    closed: AtomicBool,
    stale: AtomicBool,
    close_calls: AtomicU32,
}

struct NullWindow {
    state: Arc<WindowState>,
}

impl ChildWindow for NullWindow {
    fn is_closed(&self) -> Result<bool, WindowError> {
        if self.state.stale.load(Ordering::SeqCst) {
            return Err(WindowError::Stale);
        }
        Ok(self.state.closed.load(Ordering::SeqCst))
    }

    fn close(&self) -> Result<(), WindowError> {
        self.state.close_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.stale.load(Ordering::SeqCst) {
            return Err(WindowError::Stale);
        }
        self.state.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Test-side view of a window opened through [`NullBrowser`].
#[derive(Clone)]
pub struct NullWindowProbe {
    url: Url,
    state: Arc<WindowState>,
}

impl NullWindowProbe {
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Close the window the way a user would, without going through the handle.
    pub fn user_close(&self) {
        self.state.closed.store(true, Ordering::SeqCst);
    }

    /// Invalidate the window reference: every further call on it fails.
    pub fn make_stale(&self) {
        self.state.stale.store(true, Ordering::SeqCst);
    }

    pub fn is_open(&self) -> bool {
        !self.state.closed.load(Ordering::SeqCst)
    }

    /// How many times the handle asked this window to close.
    pub fn close_calls(&self) -> u32 {
        self.state.close_calls.load(Ordering::SeqCst)
    }
}

/// A browser whose popups are plain in-memory flags.
#[derive(Default)]
pub struct NullBrowser {
    blocked: AtomicBool,
    opened: Mutex<Vec<NullWindowProbe>>,
}

impl NullBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `open` calls fail as if a popup blocker were active.
    pub fn block_popups(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Every window opened so far, oldest first.
    pub fn windows(&self) -> Vec<NullWindowProbe> {
        self.opened.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn last_window(&self) -> Option<NullWindowProbe> {
        self.windows().pop()
    }

    /// Number of windows currently open.
    pub fn open_count(&self) -> usize {
        self.windows().iter().filter(|w| w.is_open()).count()
    }
}

impl WindowOpener for NullBrowser {
    fn open(&self, url: &Url) -> Option<Box<dyn ChildWindow>> {
        if self.blocked.load(Ordering::SeqCst) {
            return None;
        }
        let state = Arc::new(WindowState::default());
        self.opened
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(NullWindowProbe {
                url: url.clone(),
                state: state.clone(),
            });
        Some(Box::new(NullWindow { state }))
    }
}
