//! Nullable provider: scripted session creation and status responses.

use async_trait::async_trait;
use ekyc_provider::{ProviderError, VerificationProvider};
use ekyc_types::{SessionCreated, SessionId, StatusResponse};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Provider failures that can be scripted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptedError {
    Unreachable,
    InvalidResponse,
    SessionNotFound,
}

impl ScriptedError {
    fn into_error(self, context: &str) -> ProviderError {
        match self {
            Self::Unreachable => ProviderError::Unreachable(format!("null provider: {context}")),
            Self::InvalidResponse => {
                ProviderError::InvalidResponse(format!("null provider: {context}"))
            }
            Self::SessionNotFound => ProviderError::SessionNotFound(context.to_string()),
        }
    }
}

#[derive(Clone, Debug)]
struct StatusStep {
    response: Result<StatusResponse, ScriptedError>,
    delay: Duration,
}

#[derive(Default)]
struct Inner {
    created: u32,
    create_script: VecDeque<Result<SessionCreated, ScriptedError>>,
    status_script: HashMap<String, VecDeque<StatusStep>>,
    status_calls: HashMap<String, u32>,
}

/// A provider that answers from a script instead of the network.
///
/// Unscripted session creations succeed with `null-session-{n}` ids.
/// Each session's status script is consumed one step per poll; the last
/// step repeats. Sessions without a script stay `pending`.
#[derive(Default)]
pub struct NullProvider {
    inner: Mutex<Inner>,
}

impl NullProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome of the next `create_session` call.
    pub fn script_create(&self, result: Result<SessionCreated, ScriptedError>) {
        self.lock().create_script.push_back(result);
    }

    /// Queue a status response for `session_id`.
    pub fn script_status(&self, session_id: &str, response: StatusResponse) {
        self.push_step(session_id, Ok(response), Duration::ZERO);
    }

    /// Queue a status response that resolves only after `delay`.
    pub fn script_status_delayed(&self, session_id: &str, response: StatusResponse, delay: Duration) {
        self.push_step(session_id, Ok(response), delay);
    }

    /// Queue a failing status call for `session_id`.
    pub fn script_status_error(&self, session_id: &str, error: ScriptedError) {
        self.push_step(session_id, Err(error), Duration::ZERO);
    }

    /// Number of successful and failed `create_session` calls so far.
    pub fn create_calls(&self) -> u32 {
        self.lock().created
    }

    /// Number of `session_status` calls made for `session_id`.
    pub fn status_calls(&self, session_id: &str) -> u32 {
        self.lock().status_calls.get(session_id).copied().unwrap_or(0)
    }

    /// Id the next unscripted `create_session` call will return.
    pub fn next_session_id(&self) -> String {
        format!("null-session-{}", self.lock().created + 1)
    }

    fn push_step(&self, session_id: &str, response: Result<StatusResponse, ScriptedError>, delay: Duration) {
        self.lock()
            .status_script
            .entry(session_id.to_string())
            .or_default()
            .push_back(StatusStep { response, delay });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // a panicking test thread must not hide the script from the others
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl VerificationProvider for NullProvider {
    async fn create_session(&self) -> Result<SessionCreated, ProviderError> {
        let mut inner = self.lock();
        inner.created += 1;
        let n = inner.created;
        match inner.create_script.pop_front() {
            Some(Ok(created)) => Ok(created),
            Some(Err(e)) => Err(e.into_error("create_session")),
            None => Ok(SessionCreated {
                session_id: format!("null-session-{n}"),
                redirect_url: format!("https://kyc.test/flow/null-session-{n}"),
            }),
        }
    }

    async fn session_status(&self, session_id: &SessionId) -> Result<StatusResponse, ProviderError> {
        let step = {
            let mut inner = self.lock();
            *inner
                .status_calls
                .entry(session_id.to_string())
                .or_default() += 1;
            match inner.status_script.get_mut(session_id.as_str()) {
                Some(script) if script.len() > 1 => script.pop_front(),
                Some(script) => script.front().cloned(),
                None => None,
            }
        };

        let Some(step) = step else {
            return Ok(StatusResponse::pending());
        };
        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }
        step.response
            .map_err(|e| e.into_error(session_id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ekyc_types::RemoteStatus;

    fn sid(s: &str) -> SessionId {
        SessionId::new(s).unwrap()
    }

    #[tokio::test]
    async fn unscripted_sessions_are_numbered() {
        let provider = NullProvider::new();
        assert_eq!(provider.next_session_id(), "null-session-1");
        let first = provider.create_session().await.unwrap();
        let second = provider.create_session().await.unwrap();
        assert_eq!(first.session_id, "null-session-1");
        assert_eq!(second.session_id, "null-session-2");
        assert_eq!(provider.create_calls(), 2);
    }

    #[tokio::test]
    async fn scripted_create_failure_is_consumed_once() {
        let provider = NullProvider::new();
        provider.script_create(Err(ScriptedError::Unreachable));
        assert!(matches!(
            provider.create_session().await,
            Err(ProviderError::Unreachable(_))
        ));
        assert!(provider.create_session().await.is_ok());
    }

    #[tokio::test]
    async fn last_status_step_repeats() {
        let provider = NullProvider::new();
        provider.script_status("s", StatusResponse::pending());
        provider.script_status("s", StatusResponse::failed("blurry photo"));

        let id = sid("s");
        assert_eq!(provider.session_status(&id).await.unwrap().status, RemoteStatus::Pending);
        assert_eq!(provider.session_status(&id).await.unwrap().status, RemoteStatus::Failed);
        assert_eq!(provider.session_status(&id).await.unwrap().status, RemoteStatus::Failed);
        assert_eq!(provider.status_calls("s"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_status_waits() {
        let provider = NullProvider::new();
        provider.script_status_delayed("s", StatusResponse::pending(), Duration::from_secs(3));
        let start = tokio::time::Instant::now();
        provider.session_status(&sid("s")).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}
