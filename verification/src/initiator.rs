//! Session creation against the eKYC provider.

use ekyc_provider::VerificationProvider;
use ekyc_types::{Clock, VerificationSession};
use std::sync::Arc;
use tracing::{info, warn};

use crate::VerificationError;

/// Creates verification sessions.
///
/// Stateless apart from its collaborators, so a failed call can simply be
/// made again.
pub struct SessionInitiator {
    provider: Arc<dyn VerificationProvider>,
    clock: Arc<dyn Clock>,
}

impl SessionInitiator {
    pub fn new(provider: Arc<dyn VerificationProvider>, clock: Arc<dyn Clock>) -> Self {
        Self { provider, clock }
    }

    /// Create a session. Any provider failure, including a malformed
    /// response, is reported as [`VerificationError::ProviderUnavailable`].
    pub async fn create_session(&self) -> Result<VerificationSession, VerificationError> {
        let created = self.provider.create_session().await.map_err(|e| {
            warn!(error = %e, "eKYC session creation failed");
            VerificationError::ProviderUnavailable(e.to_string())
        })?;

        let session = VerificationSession::from_created(created, self.clock.now()).map_err(|e| {
            warn!(error = %e, "eKYC provider returned an unusable session");
            VerificationError::ProviderUnavailable(e.to_string())
        })?;

        info!(
            session_id = %session.session_id(),
            redirect = %session.redirect_url(),
            "eKYC session created"
        );
        Ok(session)
    }
}
