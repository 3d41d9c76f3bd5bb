use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("HTTP request to provider failed: {0}")]
    RequestFailed(String),

    #[error("invalid response from provider: {0}")]
    InvalidResponse(String),

    /// The provider does not know the session (expired or never existed).
    #[error("session {0} not found at provider")]
    SessionNotFound(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Unreachable(format!("request timed out: {e}"))
        } else if e.is_connect() {
            ProviderError::Unreachable(format!("connection failed: {e}"))
        } else if e.is_decode() {
            ProviderError::InvalidResponse(e.to_string())
        } else {
            ProviderError::RequestFailed(e.to_string())
        }
    }
}
