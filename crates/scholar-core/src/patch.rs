//! Partial updates and the merge engine.
//!
//! A [`StudentPatch`] distinguishes a field that was left out of the request
//! ([`FieldUpdate::Unchanged`]) from one that was sent, even when the value
//! sent is empty or `null` ([`FieldUpdate::Set`]). Sending an empty value is a
//! deliberate clear; leaving the field out never touches the stored value.
//!
//! On the wire a missing key is `Unchanged` and a present key is `Set`. For
//! the optional fields (`date_of_birth`, `gender`) a JSON `null` therefore
//! becomes `Set(None)`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
  Result,
  student::{Gender, NewStudent, Student, StudentField},
  validate,
};

// ─── FieldUpdate ─────────────────────────────────────────────────────────────

/// The state of one field in a partial update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate<T> {
  /// The field was absent; keep the stored value.
  Unchanged,
  /// The field was provided; overwrite the stored value with this one.
  Set(T),
}

impl<T> Default for FieldUpdate<T> {
  fn default() -> Self { Self::Unchanged }
}

impl<T> From<Option<T>> for FieldUpdate<T> {
  fn from(value: Option<T>) -> Self {
    value.map_or(Self::Unchanged, Self::Set)
  }
}

impl<T> FieldUpdate<T> {
  pub fn is_unchanged(&self) -> bool { matches!(self, Self::Unchanged) }

  /// The provided value, if any.
  pub fn as_set(&self) -> Option<&T> {
    match self {
      Self::Set(v) => Some(v),
      Self::Unchanged => None,
    }
  }

  /// Overwrite `target` if this update carries a value.
  pub fn apply(self, target: &mut T) {
    if let Self::Set(v) = self {
      *target = v;
    }
  }
}

impl<T: Serialize> Serialize for FieldUpdate<T> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Self::Set(v) => v.serialize(serializer),
      // Only reached when a containing struct forgets
      // `skip_serializing_if = "FieldUpdate::is_unchanged"`.
      Self::Unchanged => serializer.serialize_none(),
    }
  }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for FieldUpdate<T> {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    T::deserialize(deserializer).map(Self::Set)
  }
}

// ─── StudentPatch ────────────────────────────────────────────────────────────

/// A partial update to a [`Student`].
///
/// `id` and the audit timestamps are not client-settable; requests carrying
/// them are rejected at deserialisation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudentPatch {
  #[serde(default, skip_serializing_if = "FieldUpdate::is_unchanged")]
  pub first_name:    FieldUpdate<String>,
  #[serde(default, skip_serializing_if = "FieldUpdate::is_unchanged")]
  pub last_name:     FieldUpdate<String>,
  #[serde(default, skip_serializing_if = "FieldUpdate::is_unchanged")]
  pub email:         FieldUpdate<String>,
  #[serde(default, skip_serializing_if = "FieldUpdate::is_unchanged")]
  pub date_of_birth: FieldUpdate<Option<NaiveDate>>,
  #[serde(default, skip_serializing_if = "FieldUpdate::is_unchanged")]
  pub gender:        FieldUpdate<Option<Gender>>,
}

impl StudentPatch {
  /// A patch that provides every field, used for full replacement.
  pub fn replace_all(input: NewStudent) -> Self {
    Self {
      first_name:    FieldUpdate::Set(input.first_name),
      last_name:     FieldUpdate::Set(input.last_name),
      email:         FieldUpdate::Set(input.email),
      date_of_birth: FieldUpdate::Set(input.date_of_birth),
      gender:        FieldUpdate::Set(input.gender),
    }
  }

  /// `true` if no field is provided.
  pub fn is_empty(&self) -> bool {
    self.first_name.is_unchanged()
      && self.last_name.is_unchanged()
      && self.email.is_unchanged()
      && self.date_of_birth.is_unchanged()
      && self.gender.is_unchanged()
  }

  /// Validate every provided field. Absent fields are not checked.
  pub fn validate(&self, today: NaiveDate) -> Result<()> {
    if let Some(v) = self.first_name.as_set() {
      validate::name(StudentField::FirstName, v)?;
    }
    if let Some(v) = self.last_name.as_set() {
      validate::name(StudentField::LastName, v)?;
    }
    if let Some(v) = self.email.as_set() {
      validate::email(v)?;
    }
    if let Some(v) = self.date_of_birth.as_set() {
      validate::date_of_birth(*v, today)?;
    }
    Ok(())
  }

  /// The fields this patch provides, in declaration order.
  pub fn provided_fields(&self) -> Vec<StudentField> {
    [
      (StudentField::FirstName, self.first_name.is_unchanged()),
      (StudentField::LastName, self.last_name.is_unchanged()),
      (StudentField::Email, self.email.is_unchanged()),
      (StudentField::DateOfBirth, self.date_of_birth.is_unchanged()),
      (StudentField::Gender, self.gender.is_unchanged()),
    ]
    .into_iter()
    .filter_map(|(field, unchanged)| (!unchanged).then_some(field))
    .collect()
  }
}

// ─── Merge engine ────────────────────────────────────────────────────────────

/// Apply `patch` to a copy of `record`, stamping `updated_at` with the current
/// time. See [`merge_at`].
pub fn merge(record: &Student, patch: StudentPatch) -> Result<Student> {
  merge_at(record, patch, Utc::now())
}

/// Apply `patch` to a copy of `record` as of `now`.
///
/// Every provided field is validated before anything is applied, so an error
/// leaves no half-merged result behind. `id` and `created_at` are never
/// touched; `updated_at` becomes `now` (or stays put if `now` is earlier).
/// Persisting the result is the caller's business.
pub fn merge_at(
  record: &Student,
  patch: StudentPatch,
  now: DateTime<Utc>,
) -> Result<Student> {
  patch.validate(now.date_naive())?;

  let StudentPatch {
    first_name,
    last_name,
    email,
    date_of_birth,
    gender,
  } = patch;

  let mut merged = record.clone();
  first_name.apply(&mut merged.first_name);
  last_name.apply(&mut merged.last_name);
  email.apply(&mut merged.email);
  date_of_birth.apply(&mut merged.date_of_birth);
  gender.apply(&mut merged.gender);
  merged.audit.touch(now);

  Ok(merged)
}
