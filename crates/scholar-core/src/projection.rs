//! The read model returned to clients.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::student::{Gender, Student};

/// The computed view of a student; derived, never stored.
///
/// Audit timestamps are left out; `age` is computed at projection time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentView {
  pub id:            Uuid,
  pub first_name:    String,
  pub last_name:     String,
  pub email:         String,
  pub date_of_birth: Option<NaiveDate>,
  pub gender:        Option<Gender>,
  /// Whole years since `date_of_birth`; absent when the date is unknown or
  /// lies in the future.
  pub age:           Option<u32>,
}

/// Project `record` as of today's (UTC) date.
pub fn project(record: &Student) -> StudentView {
  project_at(record, Utc::now().date_naive())
}

/// Project `record` as of `today`.
pub fn project_at(record: &Student, today: NaiveDate) -> StudentView {
  StudentView {
    id:            record.id,
    first_name:    record.first_name.clone(),
    last_name:     record.last_name.clone(),
    email:         record.email.clone(),
    date_of_birth: record.date_of_birth,
    gender:        record.gender,
    age:           record.date_of_birth.and_then(|dob| age_on(dob, today)),
  }
}

/// Whole years elapsed between `dob` and `today`, or `None` if `dob` is after
/// `today`.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> Option<u32> {
  today.years_since(dob)
}
