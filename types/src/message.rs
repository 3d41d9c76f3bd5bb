//! Cross-window messages posted by the provider's page.

use serde::{Deserialize, Serialize};

use crate::SessionId;

/// A message received on the host page, before validation.
#[derive(Clone, Debug, PartialEq)]
pub struct IncomingMessage {
    /// Origin of the sending window, as reported by the browser.
    pub origin: String,
    /// Raw message payload.
    pub data: serde_json::Value,
}

impl IncomingMessage {
    pub fn new(origin: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            origin: origin.into(),
            data,
        }
    }

    /// Decode the payload. Unknown or malformed payloads yield `None`.
    pub fn decode(&self) -> Option<WindowMessage> {
        serde_json::from_value(self.data.clone()).ok()
    }
}

/// The recognized message shapes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WindowMessage {
    /// The provider page reports a completed verification.
    #[serde(rename = "ekyc-verified", rename_all = "camelCase")]
    Verified { session_id: SessionId },
    /// The provider page asks the host to close it.
    #[serde(rename = "ekyc-close-popup", rename_all = "camelCase")]
    ClosePopup { session_id: SessionId },
}

impl WindowMessage {
    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::Verified { session_id } | Self::ClosePopup { session_id } => session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_verified_message() {
        let msg = IncomingMessage::new(
            "https://booking.example",
            json!({"type": "ekyc-verified", "sessionId": "s-1"}),
        );
        assert_eq!(
            msg.decode(),
            Some(WindowMessage::Verified {
                session_id: SessionId::new("s-1").unwrap()
            })
        );
    }

    #[test]
    fn decodes_close_message() {
        let msg = IncomingMessage::new(
            "https://booking.example",
            json!({"type": "ekyc-close-popup", "sessionId": "s-2"}),
        );
        let decoded = msg.decode().unwrap();
        assert!(matches!(decoded, WindowMessage::ClosePopup { .. }));
        assert_eq!(decoded.session_id().as_str(), "s-2");
    }

    #[test]
    fn unknown_type_is_ignored() {
        let msg = IncomingMessage::new(
            "https://booking.example",
            json!({"type": "webpackHotUpdate", "hash": "abc"}),
        );
        assert_eq!(msg.decode(), None);
    }

    #[test]
    fn missing_session_id_is_ignored() {
        let msg = IncomingMessage::new("https://booking.example", json!({"type": "ekyc-verified"}));
        assert_eq!(msg.decode(), None);
    }
}
