//! The canonical stored student record.
//!
//! Audit timestamps are carried by an embedded [`AuditInfo`] value and are
//! only ever assigned by explicit calls: [`AuditInfo::new`] at creation and
//! [`AuditInfo::touch`] when a patch is merged.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result, validate};

// ─── Gender ──────────────────────────────────────────────────────────────────

/// The fixed set of gender categories. Stored and serialised as `MALE`,
/// `FEMALE` or `OTHER`; parsing is case-insensitive.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize,
  Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(try_from = "String", into = "String")]
pub enum Gender {
  Male,
  Female,
  Other,
}

impl TryFrom<String> for Gender {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownGender(s))
  }
}

impl From<Gender> for String {
  fn from(g: Gender) -> Self { g.to_string() }
}

// ─── Field names ─────────────────────────────────────────────────────────────

/// The client-settable fields of a [`Student`]. Used to name the offending
/// field in validation errors.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize,
  Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StudentField {
  FirstName,
  LastName,
  Email,
  DateOfBirth,
  Gender,
}

// ─── Audit ───────────────────────────────────────────────────────────────────

/// Creation and last-modification timestamps.
///
/// `updated_at >= created_at` holds for every value of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuditInfo {
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl AuditInfo {
  /// Audit info for a record created at `now`.
  pub fn new(now: DateTime<Utc>) -> Self {
    Self { created_at: now, updated_at: now }
  }

  /// Rebuild from stored timestamps. Returns `None` if `updated_at` precedes
  /// `created_at`.
  pub fn from_parts(
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
  ) -> Option<Self> {
    (updated_at >= created_at).then_some(Self { created_at, updated_at })
  }

  /// Record a modification at `now`. A clock that has gone backwards leaves
  /// `updated_at` where it is.
  pub fn touch(&mut self, now: DateTime<Utc>) {
    if now > self.updated_at {
      self.updated_at = now;
    }
  }

  pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

  pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
}

// ─── Student ─────────────────────────────────────────────────────────────────

/// One student, as persisted by a [`crate::store::StudentStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Student {
  /// Assigned by the store at creation; never changes.
  pub id:            Uuid,
  pub first_name:    String,
  pub last_name:     String,
  /// Unique across all students (case-insensitive). Empty means cleared.
  pub email:         String,
  pub date_of_birth: Option<NaiveDate>,
  pub gender:        Option<Gender>,
  pub audit:         AuditInfo,
}

impl Student {
  /// Build a freshly-created student. Validates `input` against the date of
  /// `now` and stamps both audit timestamps with `now`.
  pub fn create(id: Uuid, input: NewStudent, now: DateTime<Utc>) -> Result<Self> {
    input.validate(now.date_naive())?;
    Ok(Self {
      id,
      first_name: input.first_name,
      last_name: input.last_name,
      email: input.email,
      date_of_birth: input.date_of_birth,
      gender: input.gender,
      audit: AuditInfo::new(now),
    })
  }
}

// ─── NewStudent ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::StudentStore::create`].
/// `id` and the audit timestamps are always set by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewStudent {
  pub first_name:    String,
  pub last_name:     String,
  pub email:         String,
  #[serde(default)]
  pub date_of_birth: Option<NaiveDate>,
  #[serde(default)]
  pub gender:        Option<Gender>,
}

impl NewStudent {
  /// Convenience constructor with the optional fields left empty.
  pub fn new(
    first_name: impl Into<String>,
    last_name: impl Into<String>,
    email: impl Into<String>,
  ) -> Self {
    Self {
      first_name:    first_name.into(),
      last_name:     last_name.into(),
      email:         email.into(),
      date_of_birth: None,
      gender:        None,
    }
  }

  /// Check every field against the rules in [`crate::validate`].
  pub fn validate(&self, today: NaiveDate) -> Result<()> {
    validate::name(StudentField::FirstName, &self.first_name)?;
    validate::name(StudentField::LastName, &self.last_name)?;
    validate::email(&self.email)?;
    validate::date_of_birth(self.date_of_birth, today)
  }
}
