//! Daemon configuration file: one TOML document with optional
//! `[handshake]` and `[sandbox]` tables.

use ekyc_sandbox::SandboxConfig;
use ekyc_verification::HandshakeConfig;
use serde::Deserialize;
use std::path::Path;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub handshake: HandshakeConfig,
    #[serde(default)]
    pub sandbox: SandboxConfig,
}

impl DaemonConfig {
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Load `path` if given. An unreadable or malformed file falls back to
    /// defaults with a warning; CLI flags still apply on top.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::from_toml_file(path) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to load config file {}: {e}, using defaults",
                    path.display()
                );
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn both_tables_are_optional() {
        let config: DaemonConfig = toml::from_str("").unwrap();
        assert_eq!(config.handshake, HandshakeConfig::default());
        assert_eq!(config.sandbox.port, 7090);
    }

    #[test]
    fn loads_tables_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[handshake]
hosting_origin = "https://booking.example"
max_poll_duration_secs = 120

[sandbox]
port = 9100
auto_verify_after = 3
"#
        )
        .unwrap();

        let config = DaemonConfig::load(Some(file.path()));
        assert_eq!(config.handshake.hosting_origin, "https://booking.example");
        assert_eq!(config.handshake.max_poll_duration_secs, 120);
        assert_eq!(config.handshake.poll_interval_ms, 1_000);
        assert_eq!(config.sandbox.port, 9100);
        assert_eq!(config.sandbox.auto_verify_after, Some(3));
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "handshake = 12").unwrap();
        let config = DaemonConfig::load(Some(file.path()));
        assert_eq!(config.handshake, HandshakeConfig::default());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = DaemonConfig::load(Some(Path::new("/nonexistent/ekyc.toml")));
        assert_eq!(config.sandbox.bind, "127.0.0.1");
    }
}
