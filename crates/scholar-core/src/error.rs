//! Error types for `scholar-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::student::StudentField;

#[derive(Debug, Error)]
pub enum Error {
  /// A field value failed validation. Raised by the validators and, as a
  /// last line of defence, by the merge engine.
  #[error("invalid {field}: {reason}")]
  Validation {
    field:  StudentField,
    reason: String,
  },

  #[error("student not found: {0}")]
  StudentNotFound(Uuid),

  #[error("email address already in use: {0:?}")]
  DuplicateEmail(String),

  /// The stored record changed between read and write.
  #[error("student {0} was modified concurrently")]
  StaleWrite(Uuid),

  #[error("unknown gender: {0:?}")]
  UnknownGender(String),
}

impl Error {
  pub(crate) fn validation(field: StudentField, reason: impl Into<String>) -> Self {
    Self::Validation { field, reason: reason.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
