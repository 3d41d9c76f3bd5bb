use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// Session creation failed at the provider. Retry immediately.
    #[error("verification provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The browser blocked the verification window. Retry after the user
    /// allows popups.
    #[error("verification window was blocked by the browser")]
    PopupBlocked,

    /// The provider reported a failed verification. Retry with a new session.
    #[error("verification failed: {0}")]
    VerificationFailed(String),

    /// No terminal status arrived within the polling ceiling.
    #[error("verification timed out after {elapsed_secs}s")]
    VerificationTimeout { elapsed_secs: u64 },

    /// The user closed the verification window before finishing.
    #[error("verification window closed before completion")]
    UserCancelled,

    #[error("no verification attempt is active")]
    NoActiveAttempt,

    #[error("config error: {0}")]
    Config(String),
}

impl VerificationError {
    /// Whether starting a new attempt can recover from this condition.
    pub fn is_retriable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}
