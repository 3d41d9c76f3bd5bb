//! In-memory session table.

use ekyc_types::{StatusResponse, VerifiedIdentity};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::SandboxError;

#[derive(Clone, Debug)]
enum Outcome {
    Pending,
    Verified(VerifiedIdentity),
    Failed(String),
}

#[derive(Debug)]
struct SandboxSession {
    created: Instant,
    polls: u32,
    outcome: Outcome,
}

/// Sessions created by the sandbox, keyed by session id.
///
/// Sessions older than the TTL are gone: lookups answer `SessionNotFound`
/// and every `create` sweeps them out of the table.
pub struct SessionTable {
    sessions: Mutex<HashMap<String, SandboxSession>>,
    auto_verify_after: Option<u32>,
    identity: VerifiedIdentity,
    ttl: Duration,
}

impl SessionTable {
    pub fn new(auto_verify_after: Option<u32>, identity: VerifiedIdentity, ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            auto_verify_after,
            identity,
            ttl,
        }
    }

    /// Create a session and return its id (16 random bytes, hex-encoded).
    pub fn create(&self) -> Result<String, SandboxError> {
        let mut bytes = [0u8; 16];
        getrandom::getrandom(&mut bytes).map_err(|e| SandboxError::Entropy(e.to_string()))?;
        let id = hex::encode(bytes);

        let mut sessions = self.lock()?;
        let before = sessions.len();
        let ttl = self.ttl;
        sessions.retain(|_, session| session.created.elapsed() < ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, "expired sandbox sessions evicted");
        }

        sessions.insert(
            id.clone(),
            SandboxSession {
                created: Instant::now(),
                polls: 0,
                outcome: Outcome::Pending,
            },
        );
        Ok(id)
    }

    /// Record a poll and return the session's status.
    pub fn poll(&self, id: &str) -> Result<StatusResponse, SandboxError> {
        let mut sessions = self.lock()?;
        let session = self.live(&mut sessions, id)?;
        session.polls = session.polls.saturating_add(1);

        if let (Outcome::Pending, Some(after)) = (&session.outcome, self.auto_verify_after) {
            if session.polls >= after {
                session.outcome = Outcome::Verified(self.identity.clone());
            }
        }

        Ok(match &session.outcome {
            Outcome::Pending => StatusResponse::pending(),
            Outcome::Verified(identity) => StatusResponse::verified(identity.clone()),
            Outcome::Failed(reason) => StatusResponse::failed(reason.clone()),
        })
    }

    /// Complete a pending session with `identity`.
    pub fn verify(&self, id: &str, identity: VerifiedIdentity) -> Result<(), SandboxError> {
        self.settle(id, Outcome::Verified(identity))
    }

    /// Fail a pending session.
    pub fn fail(&self, id: &str, reason: String) -> Result<(), SandboxError> {
        self.settle(id, Outcome::Failed(reason))
    }

    /// Drop a session, as the provider does when it expires.
    pub fn expire(&self, id: &str) -> Result<(), SandboxError> {
        self.lock()?
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| SandboxError::SessionNotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn settle(&self, id: &str, outcome: Outcome) -> Result<(), SandboxError> {
        let mut sessions = self.lock()?;
        let session = self.live(&mut sessions, id)?;
        if !matches!(session.outcome, Outcome::Pending) {
            return Err(SandboxError::AlreadySettled(id.to_string()));
        }
        session.outcome = outcome;
        Ok(())
    }

    /// Look up a session that has not outlived the TTL, dropping it if it has.
    fn live<'a>(
        &self,
        sessions: &'a mut HashMap<String, SandboxSession>,
        id: &str,
    ) -> Result<&'a mut SandboxSession, SandboxError> {
        let expired = sessions
            .get(id)
            .is_some_and(|session| session.created.elapsed() >= self.ttl);
        if expired {
            sessions.remove(id);
        }
        sessions
            .get_mut(id)
            .ok_or_else(|| SandboxError::SessionNotFound(id.to_string()))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, SandboxSession>>, SandboxError> {
        self.sessions
            .lock()
            .map_err(|_| SandboxError::Server("session table poisoned".to_string()))
    }
}
