//! HTTP client for the provider's session endpoints.

use async_trait::async_trait;
use ekyc_types::{SessionCreated, SessionId, StatusResponse};
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

use crate::error::ProviderError;
use crate::VerificationProvider;

/// Default timeout for provider requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the provider's REST endpoints, rooted at a base URL.
///
/// The base URL may carry a path prefix (`https://api.example/v1`); endpoint
/// segments are appended to it.
#[derive(Clone)]
pub struct HttpProvider {
    /// HTTP client (reusable connection pool).
    http: reqwest::Client,
    base_url: Url,
}

impl HttpProvider {
    /// Create a client with default timeout settings.
    pub fn new(base_url: &str) -> Result<Self, ProviderError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ProviderError::RequestFailed(format!("invalid base URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::RequestFailed(format!(
                "base URL {base_url} cannot carry a path"
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::RequestFailed(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { http, base_url })
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in the constructor
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl VerificationProvider for HttpProvider {
    /// `POST {base}/ekyc/session` -> SessionCreated
    async fn create_session(&self) -> Result<SessionCreated, ProviderError> {
        let url = self.endpoint(&["ekyc", "session"]);
        tracing::debug!(%url, "creating eKYC session");

        let response = self.http.post(url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        response.json::<SessionCreated>().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("failed to parse session response: {e}"))
        })
    }

    /// `GET {base}/ekyc/session/{id}/status` -> StatusResponse
    async fn session_status(&self, session_id: &SessionId) -> Result<StatusResponse, ProviderError> {
        let url = self.endpoint(&["ekyc", "session", session_id.as_str(), "status"]);

        let response = self.http.get(url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::GONE => {
                return Err(ProviderError::SessionNotFound(session_id.to_string()));
            }
            status if !status.is_success() => {
                return Err(ProviderError::RequestFailed(format!("HTTP status {status}")));
            }
            _ => {}
        }

        response.json::<StatusResponse>().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("failed to parse status response: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_appends_to_base_path() {
        let provider = HttpProvider::new("https://api.example.com/v1/").unwrap();
        assert_eq!(
            provider.endpoint(&["ekyc", "session"]).as_str(),
            "https://api.example.com/v1/ekyc/session"
        );
    }

    #[test]
    fn endpoint_escapes_session_id() {
        let provider = HttpProvider::new("https://api.example.com").unwrap();
        let url = provider.endpoint(&["ekyc", "session", "a/b c", "status"]);
        assert_eq!(
            url.as_str(),
            "https://api.example.com/ekyc/session/a%2Fb%20c/status"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(HttpProvider::new("not a url").is_err());
        assert!(HttpProvider::new("mailto:kyc@example.com").is_err());
    }
}
