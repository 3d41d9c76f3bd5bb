//! Nullable infrastructure for deterministic testing.
//!
//! All external dependencies of the handshake (clock, provider, browser
//! windows) are abstracted behind traits. This crate provides test-friendly
//! implementations that:
//! - Return scripted, deterministic values
//! - Can be controlled programmatically (close a popup "as the user")
//! - Record every call for assertions
//! - Never touch the network or a real browser
//!
//! Usage: swap real implementations for nullables in tests.

pub mod browser;
pub mod clock;
pub mod provider;

pub use browser::{NullBrowser, NullWindowProbe};
pub use clock::NullClock;
pub use provider::{NullProvider, ScriptedError};
