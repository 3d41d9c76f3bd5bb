//! Sandbox configuration with TOML support.

use ekyc_types::VerifiedIdentity;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the sandbox provider.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Public base URL used to build redirect URLs. Defaults to
    /// `http://{bind}:{port}`.
    #[serde(default)]
    pub public_url: Option<String>,

    /// Verify every session automatically after this many status polls.
    #[serde(default)]
    pub auto_verify_after: Option<u32>,

    /// Seconds a session lives before the sandbox forgets it.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// Identity returned by auto-verified sessions.
    #[serde(default = "default_identity")]
    pub identity: VerifiedIdentity,
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7090
}

fn default_session_ttl_secs() -> u64 {
    900
}

fn default_identity() -> VerifiedIdentity {
    VerifiedIdentity {
        full_name: "Nguyen Van A".to_string(),
        id_number: "001234567890".to_string(),
        address: "12 Le Loi, Phu Hoi, Hue".to_string(),
    }
}

impl SandboxConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Base URL redirect links point at.
    pub fn public_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.bind, self.port),
        }
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            public_url: None,
            auto_verify_after: None,
            session_ttl_secs: default_session_ttl_secs(),
            identity: default_identity(),
        }
    }
}
