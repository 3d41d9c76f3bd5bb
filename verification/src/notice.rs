//! User-facing notices surfaced by the handshake.

use ekyc_utils::format_duration;
use std::fmt;
use std::time::Duration;

/// How a notice should be styled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Success,
    /// Needs user action but is not an error (blocked popup, closed window).
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// Identity confirmed and written into the form.
    Verified,
    /// The browser blocked the verification window.
    EnablePopups,
    /// The provider could not create a session.
    ProviderUnavailable { detail: String },
    /// The provider rejected the verification.
    VerificationFailed { reason: String },
    /// No outcome within the polling ceiling.
    TimedOut { after: Duration },
    /// The user closed the verification window before finishing.
    WindowClosed,
}

impl Notice {
    pub fn severity(&self) -> Severity {
        match self {
            Self::Verified => Severity::Success,
            Self::EnablePopups | Self::WindowClosed => Severity::Warning,
            Self::ProviderUnavailable { .. }
            | Self::VerificationFailed { .. }
            | Self::TimedOut { .. } => Severity::Error,
        }
    }

    /// Every unsuccessful outcome offers a retry.
    pub fn retry_available(&self) -> bool {
        !matches!(self, Self::Verified)
    }

    pub fn message(&self) -> String {
        match self {
            Self::Verified => "Identity verified. Your details have been filled in.".to_string(),
            Self::EnablePopups => "The verification window was blocked. Please enable popups for this site and try again.".to_string(),
            Self::ProviderUnavailable { .. } => {
                "Could not start identity verification. Please try again.".to_string()
            }
            Self::VerificationFailed { reason } => {
                format!("Identity verification failed: {reason}")
            }
            Self::TimedOut { after } => format!(
                "Identity verification timed out after {}. Please try again.",
                format_duration(*after)
            ),
            Self::WindowClosed => {
                "Verification window closed, please complete verification.".to_string()
            }
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_not_error_styled() {
        assert_eq!(Notice::WindowClosed.severity(), Severity::Warning);
        assert!(Notice::WindowClosed.retry_available());
    }

    #[test]
    fn success_offers_no_retry() {
        assert_eq!(Notice::Verified.severity(), Severity::Success);
        assert!(!Notice::Verified.retry_available());
    }

    #[test]
    fn timeout_message_names_duration() {
        let notice = Notice::TimedOut {
            after: Duration::from_secs(300),
        };
        assert!(notice.message().contains("5m"));
        assert_eq!(notice.severity(), Severity::Error);
    }

    #[test]
    fn popup_notice_mentions_popups() {
        assert!(Notice::EnablePopups.to_string().contains("enable popups"));
    }
}
