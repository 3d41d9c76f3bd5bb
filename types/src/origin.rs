//! Web origins (`scheme://host[:port]`) used to filter cross-window messages.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::TypesError;

/// A normalized, tuple-style web origin.
///
/// Default ports are dropped and the host is lowercased, so
/// `https://Booking.example:443` and `https://booking.example` compare equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Origin(String);

impl Origin {
    /// Parse an origin from either a bare origin or any URL on that origin.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let url = Url::parse(raw).map_err(|_| TypesError::InvalidOrigin(raw.to_string()))?;
        Self::of(&url)
    }

    /// The origin of a URL. Opaque origins (`data:`, `file:`) are rejected.
    pub fn of(url: &Url) -> Result<Self, TypesError> {
        let origin = url.origin();
        if !origin.is_tuple() {
            return Err(TypesError::InvalidOrigin(url.to_string()));
        }
        Ok(Self(origin.ascii_serialization()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against an unparsed origin string as delivered with a message.
    pub fn matches(&self, raw: &str) -> bool {
        Self::parse(raw).map(|o| o == *self).unwrap_or(false)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Origin {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Origin> for String {
    fn from(o: Origin) -> Self {
        o.0
    }
}
