//! eKYC identity-verification handshake.
//!
//! Flow:
//! 1. **Session**: [`SessionInitiator`] asks the provider for a session id and
//!    redirect URL.
//! 2. **Popup**: [`PopupController`] opens the provider page in a child window
//!    and watches for the user closing it.
//! 3. **Completion**: [`StatusPoller`] polls the session status while
//!    [`MessageListener`] accepts `postMessage` notifications from the popup.
//! 4. **Convergence**: [`Reconciler`] lets the first terminal signal decide
//!    the outcome; every later signal for the same session is a no-op.
//!
//! [`EkycHandshake`] owns all of the above for one form instance and writes
//! the verified identity into a [`HostForm`].

pub mod config;
pub mod error;
pub mod form;
pub mod handshake;
pub mod initiator;
pub mod listener;
pub mod notice;
pub mod poller;
pub mod popup;
pub mod reconciler;

pub use config::HandshakeConfig;
pub use error::VerificationError;
pub use form::{FormError, HostForm, IdentityField, RegistrationForm};
pub use handshake::{EkycHandshake, HandshakeDeps};
pub use initiator::SessionInitiator;
pub use listener::{ListenerSubscription, MessageListener, Rejection};
pub use notice::{Notice, Severity};
pub use poller::StatusPoller;
pub use popup::{PopupController, PopupHandle, PopupState};
pub use reconciler::{AttemptOutcome, Effect, Reconciler, Signal};
