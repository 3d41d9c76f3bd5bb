//! Fixed-cadence status polling with a hard wall-clock ceiling.
//!
//! Each run is identified by a generation. Observations are tagged with it,
//! and [`StatusPoller::stop_polling`] retires it: a request already in flight
//! is allowed to finish, but its result is dropped instead of reported.

use ekyc_provider::{ProviderError, VerificationProvider};
use ekyc_types::{RemoteStatus, SessionId, StatusResponse};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::reconciler::{PollObservation, Signal};

/// No run is active.
const IDLE: u64 = 0;

/// Polls a session's status until it settles, times out or is stopped.
pub struct StatusPoller {
    provider: Arc<dyn VerificationProvider>,
    interval: Duration,
    max_duration: Duration,
    /// Generation whose observations may still be reported.
    active: Arc<AtomicU64>,
    ticker: Option<JoinHandle<()>>,
}

impl StatusPoller {
    pub fn new(
        provider: Arc<dyn VerificationProvider>,
        interval: Duration,
        max_duration: Duration,
    ) -> Self {
        Self {
            provider,
            interval,
            max_duration,
            active: Arc::new(AtomicU64::new(IDLE)),
            ticker: None,
        }
    }

    /// Start polling `session_id` as run `generation` (must be non-zero),
    /// replacing any earlier run. Terminal observations are sent to `sink`.
    pub fn start_polling(
        &mut self,
        generation: u64,
        session_id: SessionId,
        sink: mpsc::UnboundedSender<Signal>,
    ) {
        debug_assert_ne!(generation, IDLE, "generation 0 is reserved");
        self.stop_polling();
        self.active.store(generation, Ordering::SeqCst);

        let run = PollRun {
            provider: self.provider.clone(),
            active: self.active.clone(),
            generation,
            session_id,
            sink,
            started: Instant::now(),
        };
        let interval = self.interval;
        let max_duration = self.max_duration;

        info!(session_id = %run.session_id, generation, "status polling started");
        self.ticker = Some(tokio::spawn(run.tick_loop(interval, max_duration)));
    }

    /// Stop the current run. Later results from it are discarded.
    pub fn stop_polling(&mut self) {
        let retired = self.active.swap(IDLE, Ordering::SeqCst);
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        if retired != IDLE {
            debug!(generation = retired, "status polling stopped");
        }
    }

    /// Generation of the run currently allowed to report, if any.
    pub fn generation(&self) -> Option<u64> {
        match self.active.load(Ordering::SeqCst) {
            IDLE => None,
            g => Some(g),
        }
    }

    pub fn is_polling(&self) -> bool {
        self.generation().is_some()
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

#[derive(Clone)]
struct PollRun {
    provider: Arc<dyn VerificationProvider>,
    active: Arc<AtomicU64>,
    generation: u64,
    session_id: SessionId,
    sink: mpsc::UnboundedSender<Signal>,
    started: Instant,
}

impl PollRun {
    fn is_current(&self) -> bool {
        self.active.load(Ordering::SeqCst) == self.generation
    }

    /// Retire this run and report its terminal observation. Only the first
    /// caller for a generation reports.
    fn finish(&self, observation: PollObservation) {
        if self
            .active
            .compare_exchange(self.generation, IDLE, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(generation = self.generation, "late poll result discarded");
            return;
        }
        let _ = self.sink.send(Signal::Poll {
            generation: self.generation,
            observation,
        });
    }

    async fn tick_loop(self, interval: Duration, max_duration: Duration) {
        let in_flight = Arc::new(AtomicBool::new(false));
        let mut ticker = tokio::time::interval_at(self.started + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if !self.is_current() {
                break;
            }

            let elapsed = self.started.elapsed();
            if elapsed >= max_duration {
                warn!(
                    session_id = %self.session_id,
                    elapsed_secs = elapsed.as_secs(),
                    "status polling hit its ceiling"
                );
                self.finish(PollObservation::TimedOut { after: elapsed });
                break;
            }

            if in_flight.swap(true, Ordering::SeqCst) {
                debug!(session_id = %self.session_id, "previous status request still in flight");
                continue;
            }

            let run = self.clone();
            let in_flight = in_flight.clone();
            tokio::spawn(async move {
                let result = run.provider.session_status(&run.session_id).await;
                in_flight.store(false, Ordering::SeqCst);
                run.handle(result);
            });
        }
    }

    fn handle(&self, result: Result<StatusResponse, ProviderError>) {
        if !self.is_current() {
            debug!(generation = self.generation, "late poll result discarded");
            return;
        }
        match result {
            Ok(response) => match response.status {
                RemoteStatus::Pending => {}
                RemoteStatus::Verified => match response.data {
                    Some(identity) => {
                        info!(session_id = %self.session_id, "provider reports verified");
                        self.finish(PollObservation::Verified(identity));
                    }
                    None => warn!(
                        session_id = %self.session_id,
                        "verified status without identity data, still polling"
                    ),
                },
                RemoteStatus::Failed => {
                    let reason = response
                        .reason
                        .unwrap_or_else(|| "verification failed".to_string());
                    info!(session_id = %self.session_id, %reason, "provider reports failure");
                    self.finish(PollObservation::Failed(reason));
                }
            },
            Err(ProviderError::SessionNotFound(_)) => {
                warn!(session_id = %self.session_id, "provider no longer knows the session");
                self.finish(PollObservation::TimedOut {
                    after: self.started.elapsed(),
                });
            }
            Err(e) => {
                warn!(session_id = %self.session_id, error = %e, "status request failed, retrying");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ekyc_nullables::{NullProvider, ScriptedError};
    use ekyc_types::VerifiedIdentity;

    fn sid(s: &str) -> SessionId {
        SessionId::new(s).unwrap()
    }

    fn identity() -> VerifiedIdentity {
        VerifiedIdentity {
            full_name: "Nguyen Van A".into(),
            id_number: "001234567890".into(),
            address: "12 Le Loi, Hue".into(),
        }
    }

    fn poller(provider: Arc<NullProvider>, max_secs: u64) -> StatusPoller {
        StatusPoller::new(
            provider,
            Duration::from_secs(1),
            Duration::from_secs(max_secs),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn reports_verified_and_stops() {
        let provider = Arc::new(NullProvider::new());
        provider.script_status("s", StatusResponse::pending());
        provider.script_status("s", StatusResponse::pending());
        provider.script_status("s", StatusResponse::verified(identity()));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poller = poller(provider.clone(), 60);
        poller.start_polling(1, sid("s"), tx);

        let signal = rx.recv().await.unwrap();
        assert_eq!(
            signal,
            Signal::Poll {
                generation: 1,
                observation: PollObservation::Verified(identity())
            }
        );
        assert!(!poller.is_polling());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(provider.status_calls("s"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn polls_once_per_interval() {
        let provider = Arc::new(NullProvider::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut poller = poller(provider.clone(), 60);
        poller.start_polling(1, sid("s"), tx);

        tokio::time::sleep(Duration::from_millis(4_500)).await;
        assert_eq!(provider.status_calls("s"), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_at_ceiling() {
        let provider = Arc::new(NullProvider::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poller = poller(provider.clone(), 5);
        let start = Instant::now();
        poller.start_polling(7, sid("s"), tx);

        match rx.recv().await.unwrap() {
            Signal::Poll {
                generation: 7,
                observation: PollObservation::TimedOut { after },
            } => assert!(after >= Duration::from_secs(5)),
            other => panic!("unexpected signal {other:?}"),
        }
        assert!(start.elapsed() >= Duration::from_secs(5));
        assert!(!poller.is_polling());

        let calls = provider.status_calls("s");
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(provider.status_calls("s"), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn late_result_after_stop_is_discarded() {
        let provider = Arc::new(NullProvider::new());
        provider.script_status_delayed(
            "s",
            StatusResponse::verified(identity()),
            Duration::from_secs(3),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poller = poller(provider.clone(), 60);
        poller.start_polling(1, sid("s"), tx);

        // First request goes out at 1s and resolves at 4s.
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(provider.status_calls("s"), 1);
        poller.stop_polling();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn skips_ticks_while_request_in_flight() {
        let provider = Arc::new(NullProvider::new());
        provider.script_status_delayed("s", StatusResponse::pending(), Duration::from_millis(2_500));
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut poller = poller(provider.clone(), 60);
        poller.start_polling(1, sid("s"), tx);

        // Requests at 1s (resolves 3.5s), ticks at 2s and 3s skipped, next at 4s.
        tokio::time::sleep(Duration::from_millis(3_800)).await;
        assert_eq!(provider.status_calls("s"), 1);
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(provider.status_calls("s"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_errors_keep_polling() {
        let provider = Arc::new(NullProvider::new());
        provider.script_status_error("s", ScriptedError::Unreachable);
        provider.script_status("s", StatusResponse::failed("document expired"));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poller = poller(provider, 60);
        poller.start_polling(1, sid("s"), tx);

        assert_eq!(
            rx.recv().await.unwrap(),
            Signal::Poll {
                generation: 1,
                observation: PollObservation::Failed("document expired".into())
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_session_converges_to_timeout() {
        let provider = Arc::new(NullProvider::new());
        provider.script_status_error("s", ScriptedError::SessionNotFound);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poller = poller(provider, 60);
        poller.start_polling(1, sid("s"), tx);

        assert!(matches!(
            rx.recv().await.unwrap(),
            Signal::Poll {
                observation: PollObservation::TimedOut { .. },
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn verified_without_data_keeps_polling() {
        let provider = Arc::new(NullProvider::new());
        provider.script_status(
            "s",
            StatusResponse {
                status: RemoteStatus::Verified,
                data: None,
                reason: None,
            },
        );
        provider.script_status("s", StatusResponse::verified(identity()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poller = poller(provider.clone(), 60);
        poller.start_polling(1, sid("s"), tx);

        assert!(matches!(
            rx.recv().await.unwrap(),
            Signal::Poll {
                observation: PollObservation::Verified(_),
                ..
            }
        ));
        assert_eq!(provider.status_calls("s"), 2);
    }
}
