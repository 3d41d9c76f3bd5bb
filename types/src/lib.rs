//! Fundamental types for the eKYC handshake.
//!
//! This crate defines the data shared across every other crate in the workspace:
//! sessions, verification status, verified identities, cross-window messages,
//! origins, timestamps, and the clock and browser-window seams.

pub mod error;
pub mod identity;
pub mod message;
pub mod origin;
pub mod session;
pub mod status;
pub mod time;
pub mod window;

pub use error::TypesError;
pub use identity::VerifiedIdentity;
pub use message::{IncomingMessage, WindowMessage};
pub use origin::Origin;
pub use session::{SessionCreated, SessionId, VerificationSession};
pub use status::{RemoteStatus, StatusResponse, VerificationStatus};
pub use time::{Clock, SystemClock, Timestamp};
pub use window::{ChildWindow, WindowError, WindowOpener};
