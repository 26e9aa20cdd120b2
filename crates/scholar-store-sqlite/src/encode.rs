//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with microsecond precision and a
//! `Z` suffix. Dates are `YYYY-MM-DD`. UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use scholar_core::student::{AuditInfo, Gender, Student};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ────────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Gender ───────────────────────────────────────────────────────────────────

pub fn encode_gender(g: Gender) -> String { g.to_string() }

pub fn decode_gender(s: &str) -> Result<Gender> {
  s.parse()
    .map_err(|_| Error::CorruptRow(format!("unknown gender: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching the field order of [`RawStudent`].
pub const STUDENT_COLUMNS: &str = "student_id, first_name, last_name, email, \
                                   date_of_birth, gender, created_at, updated_at";

/// Raw strings read directly from a `students` row.
pub struct RawStudent {
  pub student_id:    String,
  pub first_name:    String,
  pub last_name:     String,
  pub email:         String,
  pub date_of_birth: Option<String>,
  pub gender:        Option<String>,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawStudent {
  /// Read a row selected with [`STUDENT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      student_id:    row.get(0)?,
      first_name:    row.get(1)?,
      last_name:     row.get(2)?,
      email:         row.get(3)?,
      date_of_birth: row.get(4)?,
      gender:        row.get(5)?,
      created_at:    row.get(6)?,
      updated_at:    row.get(7)?,
    })
  }

  pub fn into_student(self) -> Result<Student> {
    let created_at = decode_dt(&self.created_at)?;
    let updated_at = decode_dt(&self.updated_at)?;
    let audit = AuditInfo::from_parts(created_at, updated_at).ok_or_else(|| {
      Error::CorruptRow(format!(
        "student {}: updated_at precedes created_at",
        self.student_id
      ))
    })?;

    Ok(Student {
      id: decode_uuid(&self.student_id)?,
      first_name: self.first_name,
      last_name: self.last_name,
      email: self.email,
      date_of_birth: self.date_of_birth.as_deref().map(decode_date).transpose()?,
      gender: self.gender.as_deref().map(decode_gender).transpose()?,
      audit,
    })
  }
}

/// The column values written for a student, in [`STUDENT_COLUMNS`] order.
pub struct EncodedStudent {
  pub student_id:    String,
  pub first_name:    String,
  pub last_name:     String,
  pub email:         String,
  pub date_of_birth: Option<String>,
  pub gender:        Option<String>,
  pub created_at:    String,
  pub updated_at:    String,
}

impl From<&Student> for EncodedStudent {
  fn from(s: &Student) -> Self {
    Self {
      student_id:    encode_uuid(s.id),
      first_name:    s.first_name.clone(),
      last_name:     s.last_name.clone(),
      email:         s.email.clone(),
      date_of_birth: s.date_of_birth.map(encode_date),
      gender:        s.gender.map(encode_gender),
      created_at:    encode_dt(s.audit.created_at()),
      updated_at:    encode_dt(s.audit.updated_at()),
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_are_fixed_width_and_ordered() {
    let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let b = a + chrono::Duration::microseconds(1);
    let (ea, eb) = (encode_dt(a), encode_dt(b));
    assert_eq!(ea, "2024-01-01T00:00:00.000000Z");
    assert_eq!(ea.len(), eb.len());
    assert!(ea < eb);
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }

  #[test]
  fn gender_column_values() {
    assert_eq!(encode_gender(Gender::Other), "OTHER");
    assert_eq!(decode_gender("FEMALE").unwrap(), Gender::Female);
    assert!(matches!(decode_gender("x"), Err(Error::CorruptRow(_))));
  }
}
