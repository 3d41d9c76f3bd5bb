//! Handshake configuration with TOML file support.

use ekyc_types::Origin;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::VerificationError;

/// Configuration for the verification handshake.
///
/// Can be loaded from a TOML file via [`HandshakeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeConfig {
    /// Origin of the page hosting the registration form. Cross-window
    /// messages from any other origin are dropped.
    #[serde(default = "default_hosting_origin")]
    pub hosting_origin: String,

    /// Base URL of the eKYC provider API.
    #[serde(default = "default_provider_url")]
    pub provider_url: String,

    /// Interval between status polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Hard ceiling on total polling time for one session.
    #[serde(default = "default_max_poll_duration_secs")]
    pub max_poll_duration_secs: u64,

    /// Interval of the timer that detects a user closing the popup.
    #[serde(default = "default_popup_check_interval_ms")]
    pub popup_check_interval_ms: u64,

    /// Timeout for a single provider request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_hosting_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_provider_url() -> String {
    "http://127.0.0.1:7090".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_max_poll_duration_secs() -> u64 {
    300
}

fn default_popup_check_interval_ms() -> u64 {
    500
}

fn default_request_timeout_secs() -> u64 {
    10
}

// ── Impl ───────────────────────────────────────────────────────────────

impl HandshakeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, VerificationError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| VerificationError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, VerificationError> {
        toml::from_str(s).map_err(|e| VerificationError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, VerificationError> {
        toml::to_string_pretty(self).map_err(|e| VerificationError::Config(e.to_string()))
    }

    /// Check that the values describe a usable handshake.
    pub fn validate(&self) -> Result<(), VerificationError> {
        self.hosting_origin()?;
        if self.poll_interval_ms == 0 {
            return Err(VerificationError::Config(
                "poll_interval_ms must be positive".into(),
            ));
        }
        if self.popup_check_interval_ms == 0 {
            return Err(VerificationError::Config(
                "popup_check_interval_ms must be positive".into(),
            ));
        }
        if self.max_poll_duration() < self.poll_interval() {
            return Err(VerificationError::Config(format!(
                "max_poll_duration_secs ({}) is shorter than one poll interval ({}ms)",
                self.max_poll_duration_secs, self.poll_interval_ms
            )));
        }
        Ok(())
    }

    pub fn hosting_origin(&self) -> Result<Origin, VerificationError> {
        Origin::parse(&self.hosting_origin).map_err(|e| VerificationError::Config(e.to_string()))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_poll_duration(&self) -> Duration {
        Duration::from_secs(self.max_poll_duration_secs)
    }

    pub fn popup_check_interval(&self) -> Duration {
        Duration::from_millis(self.popup_check_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            hosting_origin: default_hosting_origin(),
            provider_url: default_provider_url(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_duration_secs: default_max_poll_duration_secs(),
            popup_check_interval_ms: default_popup_check_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
