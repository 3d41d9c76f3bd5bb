//! Verification sessions issued by the eKYC provider.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::{Timestamp, TypesError};

/// Provider-issued identifier for a single verification attempt.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a session id, rejecting empty or whitespace-only strings.
    pub fn new(raw: impl Into<String>) -> Result<Self, TypesError> {
        let s = raw.into();
        if s.trim().is_empty() {
            return Err(TypesError::EmptySessionId);
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw body of `POST /ekyc/session`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub session_id: String,
    pub redirect_url: String,
}

/// A created verification session.
///
/// Immutable after creation. Owned by the form instance that started it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationSession {
    session_id: SessionId,
    redirect_url: Url,
    created_at: Timestamp,
}

impl VerificationSession {
    /// Validate a provider response and stamp it with the creation time.
    pub fn from_created(created: SessionCreated, now: Timestamp) -> Result<Self, TypesError> {
        let session_id = SessionId::new(created.session_id)?;
        let redirect_url =
            Url::parse(&created.redirect_url).map_err(|e| TypesError::InvalidRedirectUrl {
                url: created.redirect_url.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            session_id,
            redirect_url,
            created_at: now,
        })
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn redirect_url(&self) -> &Url {
        &self.redirect_url
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}
