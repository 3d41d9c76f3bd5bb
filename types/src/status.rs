//! Local verification status and the provider's status response.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::VerifiedIdentity;

/// Status of the handshake as seen by the host form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// No attempt running.
    #[default]
    Idle,
    /// Session created, popup open, waiting for a terminal status.
    Polling,
    /// Provider confirmed the identity.
    Verified,
    /// Provider reported a failed verification.
    Failed,
    /// No terminal status within the polling ceiling.
    Timeout,
}

impl VerificationStatus {
    /// Terminal states admit no further transition for the same session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Verified | Self::Failed | Self::Timeout)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Polling => "polling",
            Self::Verified => "verified",
            Self::Failed => "failed",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status reported by `GET /ekyc/session/{id}/status`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteStatus {
    Pending,
    Verified,
    Failed,
}

/// Body of `GET /ekyc/session/{id}/status`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: RemoteStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<VerifiedIdentity>,
    /// Provider-supplied explanation for a `failed` status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl StatusResponse {
    pub fn pending() -> Self {
        Self {
            status: RemoteStatus::Pending,
            data: None,
            reason: None,
        }
    }

    pub fn verified(identity: VerifiedIdentity) -> Self {
        Self {
            status: RemoteStatus::Verified,
            data: Some(identity),
            reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: RemoteStatus::Failed,
            data: None,
            reason: Some(reason.into()),
        }
    }
}
