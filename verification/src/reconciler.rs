//! Convergence of the racing completion signals.
//!
//! Poll observations, cross-window messages and popup-closure detection all
//! arrive as [`Signal`]s. [`Reconciler::apply`] turns each one into the
//! [`Effect`]s to run. Only the first signal that settles an attempt has any
//! user-visible effect; everything after it, and anything tagged with a
//! retired poll generation or another session, is a no-op.

use ekyc_types::{SessionId, VerificationStatus, VerifiedIdentity};
use std::time::Duration;
use tracing::debug;

use crate::{Notice, VerificationError};

/// A terminal observation made by the status poller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollObservation {
    Verified(VerifiedIdentity),
    Failed(String),
    /// Ceiling reached, or the provider no longer knows the session.
    TimedOut { after: Duration },
}

/// What a validated cross-window message asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    /// `ekyc-verified`: close the popup; the poller still decides the outcome.
    Verified,
    /// `ekyc-close-popup`
    CloseRequested,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListenerAction {
    pub session_id: SessionId,
    pub kind: MessageKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Signal {
    Poll {
        generation: u64,
        observation: PollObservation,
    },
    /// The popup watcher saw the window closed by someone other than us.
    PopupClosed { generation: u64 },
    Message(ListenerAction),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    StopPolling,
    ClosePopup,
    /// Clear the closure watcher but leave the window open.
    StopPopupWatch,
    ApplyIdentity(VerifiedIdentity),
    LockIdentityFields,
    Status(VerificationStatus),
    Notify(Notice),
}

/// How an attempt ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    Verified(VerifiedIdentity),
    Failed(String),
    TimedOut { after: Duration },
    Cancelled,
}

impl AttemptOutcome {
    pub fn into_result(self) -> Result<VerifiedIdentity, VerificationError> {
        match self {
            Self::Verified(identity) => Ok(identity),
            Self::Failed(reason) => Err(VerificationError::VerificationFailed(reason)),
            Self::TimedOut { after } => Err(VerificationError::VerificationTimeout {
                elapsed_secs: after.as_secs(),
            }),
            Self::Cancelled => Err(VerificationError::UserCancelled),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Active {
    generation: u64,
    session_id: SessionId,
}

/// The reducer owning [`VerificationStatus`].
#[derive(Debug, Default)]
pub struct Reconciler {
    status: VerificationStatus,
    active: Option<Active>,
    outcome: Option<AttemptOutcome>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> VerificationStatus {
        self.status
    }

    /// The outcome of the current attempt, once settled.
    pub fn outcome(&self) -> Option<&AttemptOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_settled(&self) -> bool {
        self.outcome.is_some()
    }

    /// Start tracking a new attempt. Signals for earlier generations are
    /// ignored from here on.
    pub fn begin(&mut self, generation: u64, session_id: SessionId) -> Vec<Effect> {
        self.active = Some(Active {
            generation,
            session_id,
        });
        self.outcome = None;
        self.status = VerificationStatus::Polling;
        vec![Effect::Status(VerificationStatus::Polling)]
    }

    /// Forget the current attempt.
    pub fn reset(&mut self) {
        self.active = None;
        self.outcome = None;
        self.status = VerificationStatus::Idle;
    }

    pub fn apply(&mut self, signal: Signal) -> Vec<Effect> {
        let Some(active) = &self.active else {
            debug!(?signal, "signal without an active attempt dropped");
            return Vec::new();
        };

        match signal {
            Signal::Message(action) => {
                if action.session_id != active.session_id {
                    debug!(session_id = %action.session_id, "message for another session dropped");
                    return Vec::new();
                }
                // Closing is idempotent, so it is honoured even after settling.
                vec![Effect::ClosePopup]
            }
            Signal::PopupClosed { generation } => {
                if generation != active.generation || self.outcome.is_some() {
                    return Vec::new();
                }
                self.settle(VerificationStatus::Idle, AttemptOutcome::Cancelled);
                vec![
                    Effect::StopPolling,
                    Effect::Status(VerificationStatus::Idle),
                    Effect::Notify(Notice::WindowClosed),
                ]
            }
            Signal::Poll {
                generation,
                observation,
            } => {
                if generation != active.generation {
                    debug!(generation, "stale poll observation discarded");
                    return Vec::new();
                }
                if self.outcome.is_some() {
                    return Vec::new();
                }
                self.apply_observation(observation)
            }
        }
    }

    fn apply_observation(&mut self, observation: PollObservation) -> Vec<Effect> {
        match observation {
            PollObservation::Verified(identity) => {
                self.settle(
                    VerificationStatus::Verified,
                    AttemptOutcome::Verified(identity.clone()),
                );
                vec![
                    Effect::StopPolling,
                    Effect::ClosePopup,
                    Effect::ApplyIdentity(identity),
                    Effect::LockIdentityFields,
                    Effect::Status(VerificationStatus::Verified),
                    Effect::Notify(Notice::Verified),
                ]
            }
            PollObservation::Failed(reason) => {
                self.settle(
                    VerificationStatus::Failed,
                    AttemptOutcome::Failed(reason.clone()),
                );
                vec![
                    Effect::StopPolling,
                    Effect::StopPopupWatch,
                    Effect::Status(VerificationStatus::Failed),
                    Effect::Notify(Notice::VerificationFailed { reason }),
                ]
            }
            PollObservation::TimedOut { after } => {
                self.settle(VerificationStatus::Timeout, AttemptOutcome::TimedOut { after });
                vec![
                    Effect::StopPolling,
                    Effect::StopPopupWatch,
                    Effect::Status(VerificationStatus::Timeout),
                    Effect::Notify(Notice::TimedOut { after }),
                ]
            }
        }
    }

    fn settle(&mut self, status: VerificationStatus, outcome: AttemptOutcome) {
        self.status = status;
        self.outcome = Some(outcome);
    }
}
