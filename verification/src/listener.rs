//! Cross-window message filtering.
//!
//! The host page forwards every `message` event it receives onto a
//! broadcast bus. The listener keeps only messages that come from the
//! hosting page's own origin and name the session currently in progress,
//! and turns them into popup-close requests.

use ekyc_types::{IncomingMessage, Origin, SessionId, WindowMessage};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::reconciler::{ListenerAction, MessageKind, Signal};

/// Why a message was dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    ForeignOrigin(String),
    Unrecognized,
    NoActiveSession,
    SessionMismatch(SessionId),
}

/// Validates messages against the hosting origin and the active session.
#[derive(Clone, Debug)]
pub struct MessageListener {
    origin: Origin,
}

impl MessageListener {
    pub fn new(origin: Origin) -> Self {
        Self { origin }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Decide what, if anything, a message asks for.
    pub fn evaluate(
        &self,
        message: &IncomingMessage,
        active: Option<&SessionId>,
    ) -> Result<ListenerAction, Rejection> {
        if !self.origin.matches(&message.origin) {
            return Err(Rejection::ForeignOrigin(message.origin.clone()));
        }
        let decoded = message.decode().ok_or(Rejection::Unrecognized)?;
        let active = active.ok_or(Rejection::NoActiveSession)?;
        if decoded.session_id() != active {
            return Err(Rejection::SessionMismatch(decoded.session_id().clone()));
        }

        let kind = match decoded {
            WindowMessage::Verified { .. } => MessageKind::Verified,
            WindowMessage::ClosePopup { .. } => MessageKind::CloseRequested,
        };
        Ok(ListenerAction {
            session_id: active.clone(),
            kind,
        })
    }

    /// Subscribe to `bus` until the returned subscription is dropped.
    ///
    /// `active` tracks the session currently in progress; accepted messages
    /// are forwarded to `sink`.
    pub fn subscribe(
        &self,
        bus: &broadcast::Sender<IncomingMessage>,
        active: watch::Receiver<Option<SessionId>>,
        sink: mpsc::UnboundedSender<Signal>,
    ) -> ListenerSubscription {
        let mut rx = bus.subscribe();
        let listener = self.clone();
        let task = tokio::spawn(async move {
            loop {
                let message = match rx.recv().await {
                    Ok(message) => message,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "message listener lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                let current = active.borrow().clone();
                match listener.evaluate(&message, current.as_ref()) {
                    Ok(action) => {
                        debug!(session_id = %action.session_id, kind = ?action.kind, "eKYC message accepted");
                        if sink.send(Signal::Message(action)).is_err() {
                            break;
                        }
                    }
                    Err(Rejection::ForeignOrigin(origin)) => {
                        warn!(%origin, expected = %listener.origin, "message from foreign origin dropped");
                    }
                    Err(Rejection::Unrecognized) => {
                        trace!("unrecognized window message ignored");
                    }
                    Err(rejection) => {
                        debug!(?rejection, "eKYC message not for the active session");
                    }
                }
            }
        });
        ListenerSubscription { task: Some(task) }
    }
}

/// Live subscription to the message bus.
pub struct ListenerSubscription {
    task: Option<JoinHandle<()>>,
}

impl ListenerSubscription {
    pub fn unsubscribe(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for ListenerSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
