//! Errors raised while constructing validated types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("session id must not be empty")]
    EmptySessionId,

    #[error("invalid redirect URL {url}: {reason}")]
    InvalidRedirectUrl { url: String, reason: String },

    #[error("invalid origin {0}")]
    InvalidOrigin(String),
}
