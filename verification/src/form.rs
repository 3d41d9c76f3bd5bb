//! The host form receiving the verification outcome.

use ekyc_types::{VerificationStatus, VerifiedIdentity};
use thiserror::Error;

use crate::Notice;

/// Callbacks the handshake drives on the form that started it.
pub trait HostForm {
    /// Overwrite the identity fields with provider-confirmed values.
    fn apply_identity(&mut self, identity: &VerifiedIdentity);

    /// Disable manual edits to the identity fields.
    fn lock_identity_fields(&mut self);

    /// Re-enable manual edits (a new attempt is starting).
    fn unlock_identity_fields(&mut self);

    fn show_notice(&mut self, notice: Notice);

    fn status_changed(&mut self, _status: VerificationStatus) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdentityField {
    FullName,
    IdNumber,
    Address,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("{0:?} is locked by identity verification")]
    FieldLocked(IdentityField),
}

/// Identity section of the registration form.
#[derive(Clone, Debug, Default)]
pub struct RegistrationForm {
    full_name: String,
    id_number: String,
    address: String,
    locked: bool,
    status: VerificationStatus,
    notices: Vec<Notice>,
}

impl RegistrationForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Manual edit from the user.
    pub fn set_field(&mut self, field: IdentityField, value: impl Into<String>) -> Result<(), FormError> {
        if self.locked {
            return Err(FormError::FieldLocked(field));
        }
        *self.slot(field) = value.into();
        Ok(())
    }

    pub fn field(&self, field: IdentityField) -> &str {
        match field {
            IdentityField::FullName => &self.full_name,
            IdentityField::IdNumber => &self.id_number,
            IdentityField::Address => &self.address,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn status(&self) -> VerificationStatus {
        self.status
    }

    /// Notices shown so far, oldest first.
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn last_notice(&self) -> Option<&Notice> {
        self.notices.last()
    }

    /// Offer the retry button when the latest notice allows it.
    pub fn can_retry(&self) -> bool {
        self.notices.last().is_some_and(Notice::retry_available)
    }

    fn slot(&mut self, field: IdentityField) -> &mut String {
        match field {
            IdentityField::FullName => &mut self.full_name,
            IdentityField::IdNumber => &mut self.id_number,
            IdentityField::Address => &mut self.address,
        }
    }
}

impl HostForm for RegistrationForm {
    fn apply_identity(&mut self, identity: &VerifiedIdentity) {
        self.full_name = identity.full_name.clone();
        self.id_number = identity.id_number.clone();
        self.address = identity.address.clone();
    }

    fn lock_identity_fields(&mut self) {
        self.locked = true;
    }

    fn unlock_identity_fields(&mut self) {
        self.locked = false;
    }

    fn show_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    fn status_changed(&mut self, status: VerificationStatus) {
        self.status = status;
    }
}
