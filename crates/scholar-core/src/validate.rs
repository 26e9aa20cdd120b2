//! Field-level validation rules shared by creation, patching and the merge
//! engine.

use chrono::NaiveDate;

use crate::{Error, Result, student::StudentField};

/// Names must contain at least one non-whitespace character.
pub fn name(field: StudentField, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::validation(field, "must not be blank"));
  }
  Ok(())
}

/// The empty string is accepted and means "no address". Anything else must
/// look like `local@domain.tld`.
pub fn email(value: &str) -> Result<()> {
  if value.is_empty() {
    return Ok(());
  }
  let invalid =
    |reason: &str| -> Result<()> { Err(Error::validation(StudentField::Email, reason)) };

  if value.chars().any(char::is_whitespace) {
    return invalid("must not contain whitespace");
  }
  let Some((local, domain)) = value.split_once('@') else {
    return invalid("missing '@'");
  };
  if local.is_empty() {
    return invalid("missing local part");
  }
  if domain.contains('@') {
    return invalid("more than one '@'");
  }
  if domain.starts_with('.') || domain.ends_with('.') || !domain.contains('.') {
    return invalid("malformed domain");
  }
  Ok(())
}

/// A date of birth, when present, must be strictly before `today`.
pub fn date_of_birth(value: Option<NaiveDate>, today: NaiveDate) -> Result<()> {
  match value {
    Some(dob) if dob >= today => Err(Error::validation(
      StudentField::DateOfBirth,
      format!("{dob} is not in the past"),
    )),
    _ => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn accepts_plain_addresses_and_empty() {
    assert!(email("a@x.com").is_ok());
    assert!(email("first.last+tag@sub.example.org").is_ok());
    assert!(email("").is_ok());
  }

  #[test]
  fn rejects_malformed_addresses() {
    for bad in ["ax.com", "@x.com", "a@x", "a@.com", "a@x.", "a b@x.com", "a@b@x.com"] {
      let err = email(bad).unwrap_err();
      assert!(
        matches!(err, Error::Validation { field: StudentField::Email, .. }),
        "{bad:?} should be rejected"
      );
    }
  }

  #[test]
  fn date_of_birth_must_be_in_the_past() {
    let today = date(2024, 6, 1);
    assert!(date_of_birth(Some(date(2000, 1, 1)), today).is_ok());
    assert!(date_of_birth(None, today).is_ok());
    assert!(date_of_birth(Some(today), today).is_err());
    assert!(date_of_birth(Some(date(2030, 1, 1)), today).is_err());
  }

  #[test]
  fn blank_names_are_rejected() {
    assert!(name(StudentField::LastName, "Lee").is_ok());
    assert!(name(StudentField::LastName, "").is_err());
    assert!(name(StudentField::LastName, " \t").is_err());
  }
}
