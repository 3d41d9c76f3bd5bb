//! Per-form owner of the verification handshake.
//!
//! [`EkycHandshake`] holds every resource the handshake needs (session,
//! popup handle, poller, listener subscription) as explicit fields. All
//! background work only sends [`Signal`]s; state changes happen in
//! [`EkycHandshake::next_event`] on the caller's task, one signal at a time.

use ekyc_provider::VerificationProvider;
use ekyc_types::{
    Clock, IncomingMessage, SessionId, VerificationSession, VerificationStatus, VerifiedIdentity,
    WindowOpener,
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

use crate::initiator::SessionInitiator;
use crate::listener::{ListenerSubscription, MessageListener};
use crate::poller::StatusPoller;
use crate::popup::{PopupController, PopupHandle};
use crate::reconciler::{AttemptOutcome, Effect, Reconciler, Signal};
use crate::{HandshakeConfig, HostForm, Notice, VerificationError};

/// External collaborators of the handshake.
#[derive(Clone)]
pub struct HandshakeDeps {
    pub provider: Arc<dyn VerificationProvider>,
    pub windows: Arc<dyn WindowOpener>,
    pub clock: Arc<dyn Clock>,
    /// Bus onto which the host page forwards its `message` events.
    pub messages: broadcast::Sender<IncomingMessage>,
}

/// Resources of one verification attempt.
struct VerificationAttempt {
    generation: u64,
    session: VerificationSession,
    popup: Option<PopupHandle>,
}

impl VerificationAttempt {
    fn dispose(&mut self) {
        if PopupController::close_safely(self.popup.as_mut()) {
            debug!(generation = self.generation, "attempt popup closed on dispose");
        }
        self.popup = None;
    }
}

/// Drives the eKYC handshake for one form instance.
pub struct EkycHandshake<F: HostForm> {
    form: F,
    initiator: SessionInitiator,
    popups: PopupController,
    poller: StatusPoller,
    listener: MessageListener,
    bus: broadcast::Sender<IncomingMessage>,
    subscription: Option<ListenerSubscription>,
    active_session: watch::Sender<Option<SessionId>>,
    status: watch::Sender<VerificationStatus>,
    reconciler: Reconciler,
    attempt: Option<VerificationAttempt>,
    generation: u64,
    signals_tx: mpsc::UnboundedSender<Signal>,
    signals_rx: mpsc::UnboundedReceiver<Signal>,
}

impl<F: HostForm> EkycHandshake<F> {
    pub fn new(config: &HandshakeConfig, deps: HandshakeDeps, form: F) -> Result<Self, VerificationError> {
        config.validate()?;
        let (signals_tx, signals_rx) = mpsc::unbounded_channel();
        let (active_session, _) = watch::channel(None);
        let (status, _) = watch::channel(VerificationStatus::Idle);

        Ok(Self {
            form,
            initiator: SessionInitiator::new(deps.provider.clone(), deps.clock),
            popups: PopupController::new(deps.windows, config.popup_check_interval()),
            poller: StatusPoller::new(
                deps.provider,
                config.poll_interval(),
                config.max_poll_duration(),
            ),
            listener: MessageListener::new(config.hosting_origin()?),
            bus: deps.messages,
            subscription: None,
            active_session,
            status,
            reconciler: Reconciler::new(),
            attempt: None,
            generation: 0,
            signals_tx,
            signals_rx,
        })
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut F {
        &mut self.form
    }

    pub fn status(&self) -> VerificationStatus {
        self.reconciler.status()
    }

    /// Follow status changes from another task.
    pub fn watch_status(&self) -> watch::Receiver<VerificationStatus> {
        self.status.subscribe()
    }

    /// The session of the current attempt, if one was started.
    pub fn session(&self) -> Option<&VerificationSession> {
        self.attempt.as_ref().map(|a| &a.session)
    }

    pub fn outcome(&self) -> Option<&AttemptOutcome> {
        self.reconciler.outcome()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_polling()
    }

    /// Whether the current attempt's popup is closed (or there is none).
    pub fn popup_closed(&self) -> bool {
        PopupController::is_closed(self.attempt.as_ref().and_then(|a| a.popup.as_ref()))
    }

    pub fn is_listening(&self) -> bool {
        self.subscription.as_ref().is_some_and(ListenerSubscription::is_active)
    }

    /// Start a verification attempt, discarding any previous one.
    ///
    /// On failure the matching notice has already been shown on the form.
    /// A blocked popup leaves no polling behind.
    pub async fn start(&mut self) -> Result<VerificationSession, VerificationError> {
        self.release_attempt();
        self.ensure_subscribed();
        self.form.unlock_identity_fields();

        let session = match self.initiator.create_session().await {
            Ok(session) => session,
            Err(e) => {
                self.form.show_notice(Notice::ProviderUnavailable {
                    detail: e.to_string(),
                });
                return Err(e);
            }
        };

        self.generation += 1;
        let generation = self.generation;
        let closed_tx = self.signals_tx.clone();
        let popup = self.popups.open(session.redirect_url(), move || {
            let _ = closed_tx.send(Signal::PopupClosed { generation });
        });
        let Some(popup) = popup else {
            self.form.show_notice(Notice::EnablePopups);
            return Err(VerificationError::PopupBlocked);
        };

        let session_id = session.session_id().clone();
        self.active_session.send_replace(Some(session_id.clone()));
        self.poller
            .start_polling(generation, session_id.clone(), self.signals_tx.clone());
        let effects = self.reconciler.begin(generation, session_id);
        self.attempt = Some(VerificationAttempt {
            generation,
            session: session.clone(),
            popup: Some(popup),
        });
        self.run_effects(effects);

        info!(session_id = %session.session_id(), generation, "verification attempt started");
        Ok(session)
    }

    /// Start over after a failure, timeout or cancellation.
    pub async fn retry(&mut self) -> Result<VerificationSession, VerificationError> {
        self.start().await
    }

    /// Wait for the next signal of the current attempt and apply it.
    ///
    /// Returns the status afterwards, or `None` when no attempt exists. Once
    /// the attempt has settled only already-queued signals are applied, then
    /// `None` is returned instead of waiting.
    pub async fn next_event(&mut self) -> Option<VerificationStatus> {
        self.attempt.as_ref()?;
        let signal = if self.reconciler.is_settled() {
            self.signals_rx.try_recv().ok()?
        } else {
            self.signals_rx.recv().await?
        };
        self.handle_signal(signal);
        Some(self.reconciler.status())
    }

    /// Apply every signal already queued, without waiting. Returns how many
    /// were applied.
    pub fn drain_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(signal) = self.signals_rx.try_recv() {
            self.handle_signal(signal);
            applied += 1;
        }
        applied
    }

    /// Pump signals until the current attempt settles.
    pub async fn run_until_settled(&mut self) -> Result<VerifiedIdentity, VerificationError> {
        loop {
            if let Some(outcome) = self.reconciler.outcome() {
                return outcome.clone().into_result();
            }
            if self.attempt.is_none() {
                return Err(VerificationError::NoActiveAttempt);
            }
            match self.signals_rx.recv().await {
                Some(signal) => self.handle_signal(signal),
                None => return Err(VerificationError::NoActiveAttempt),
            }
        }
    }

    /// Start an attempt and wait for its outcome.
    pub async fn verify(&mut self) -> Result<VerifiedIdentity, VerificationError> {
        self.start().await?;
        self.run_until_settled().await
    }

    /// Tear everything down: stop polling, clear the popup watcher, close the
    /// popup, unsubscribe from messages. Idempotent.
    pub fn dispose(&mut self) {
        self.release_attempt();
        if let Some(mut subscription) = self.subscription.take() {
            subscription.unsubscribe();
            debug!("message listener unsubscribed");
        }
    }

    fn ensure_subscribed(&mut self) {
        if self.is_listening() {
            return;
        }
        self.subscription = Some(self.listener.subscribe(
            &self.bus,
            self.active_session.subscribe(),
            self.signals_tx.clone(),
        ));
    }

    fn release_attempt(&mut self) {
        self.poller.stop_polling();
        if let Some(mut attempt) = self.attempt.take() {
            attempt.dispose();
            debug!(generation = attempt.generation, "verification attempt released");
        }
        self.active_session.send_replace(None);
        if self.reconciler.status() != VerificationStatus::Idle {
            self.set_status(VerificationStatus::Idle);
        }
        self.reconciler.reset();
    }

    fn handle_signal(&mut self, signal: Signal) {
        let effects = self.reconciler.apply(signal);
        self.run_effects(effects);
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StopPolling => self.poller.stop_polling(),
                Effect::ClosePopup => {
                    let popup = self.attempt.as_mut().and_then(|a| a.popup.as_mut());
                    if PopupController::close_safely(popup) {
                        debug!("verification popup closed");
                    }
                }
                Effect::StopPopupWatch => {
                    if let Some(popup) = self.attempt.as_mut().and_then(|a| a.popup.as_mut()) {
                        popup.stop_watching();
                    }
                }
                Effect::ApplyIdentity(identity) => self.form.apply_identity(&identity),
                Effect::LockIdentityFields => self.form.lock_identity_fields(),
                Effect::Status(status) => self.set_status(status),
                Effect::Notify(notice) => {
                    if notice.retry_available() {
                        warn!(notice = %notice, "verification attempt ended");
                    } else {
                        info!(notice = %notice, "verification attempt ended");
                    }
                    self.form.show_notice(notice);
                }
            }
        }
    }

    fn set_status(&mut self, status: VerificationStatus) {
        self.status.send_replace(status);
        self.form.status_changed(status);
    }
}

impl<F: HostForm> Drop for EkycHandshake<F> {
    fn drop(&mut self) {
        self.dispose();
    }
}
