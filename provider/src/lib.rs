//! eKYC provider access.
//!
//! The verification handshake talks to the third-party provider through two
//! endpoints:
//! - `POST /ekyc/session` → `{ sessionId, redirectUrl }`
//! - `GET /ekyc/session/{sessionId}/status` → `{ status, data?, reason? }`
//!
//! [`VerificationProvider`] abstracts them so the handshake can run against
//! the real HTTP endpoints ([`HttpProvider`]) or a scripted double.

pub mod client;
pub mod error;

pub use client::HttpProvider;
pub use error::ProviderError;

use async_trait::async_trait;
use ekyc_types::{SessionCreated, SessionId, StatusResponse};

/// Remote operations offered by the eKYC provider.
#[async_trait]
pub trait VerificationProvider: Send + Sync {
    /// Create a new verification session.
    async fn create_session(&self) -> Result<SessionCreated, ProviderError>;

    /// Query the current status of a session.
    async fn session_status(&self, session_id: &SessionId) -> Result<StatusResponse, ProviderError>;
}
