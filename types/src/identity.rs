//! Identity fields returned by the provider on successful verification.

use serde::{Deserialize, Serialize};

/// The identity extracted by the provider.
///
/// Authoritative once received: it overwrites whatever the user typed into
/// the same form fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedIdentity {
    pub full_name: String,
    pub id_number: String,
    pub address: String,
}
