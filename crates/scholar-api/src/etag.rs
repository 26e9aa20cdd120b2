//! ETags for student resources.
//!
//! An ETag is a SHA-256 hash over the student id and its `updated_at`
//! timestamp (microsecond precision, the resolution the store keeps). Every
//! successful save moves `updated_at`, so every save yields a new ETag.

use scholar_core::student::Student;
use sha2::{Digest, Sha256};

/// Compute the quoted ETag for `student`.
pub fn compute_etag(student: &Student) -> String {
  let mut hasher = Sha256::new();
  hasher.update(student.id.as_bytes());
  hasher.update(student.audit.updated_at().timestamp_micros().to_le_bytes());
  format!("\"{}\"", hex::encode(hasher.finalize()))
}

/// Whether an `If-Match` header value admits `current`.
///
/// Accepts `*`, a comma-separated list, and tags sent without the
/// surrounding quotes. `If-Match` uses strong comparison (RFC 7232 §3.1), so
/// weak (`W/`) tags never match.
pub fn if_match_admits(header: &str, current: &str) -> bool {
  let current = strip_etag_quotes(current);
  header.split(',').map(str::trim).any(|candidate| {
    candidate == "*"
      || (!candidate.starts_with("W/") && strip_etag_quotes(candidate) == current)
  })
}

/// Strip surrounding double-quotes from an ETag value.
fn strip_etag_quotes(s: &str) -> &str { s.trim_matches('"') }

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone, Utc};
  use scholar_core::{
    patch::{StudentPatch, merge_at},
    student::NewStudent,
  };
  use uuid::Uuid;

  use super::*;

  fn student() -> Student {
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Student::create(Uuid::new_v4(), NewStudent::new("Ann", "Lee", "a@x.com"), now).unwrap()
  }

  #[test]
  fn etag_is_quoted_and_stable() {
    let s = student();
    let tag = compute_etag(&s);
    assert!(tag.starts_with('"') && tag.ends_with('"'));
    assert_eq!(tag, compute_etag(&s.clone()));
  }

  #[test]
  fn merge_changes_etag() {
    let s = student();
    let later = s.audit.updated_at() + Duration::seconds(1);
    let merged = merge_at(&s, StudentPatch::default(), later).unwrap();
    assert_ne!(compute_etag(&s), compute_etag(&merged));
  }

  #[test]
  fn if_match_forms() {
    let tag = "\"abc\"";
    assert!(if_match_admits("\"abc\"", tag));
    assert!(if_match_admits("abc", tag));
    assert!(!if_match_admits("W/\"abc\"", tag));
    assert!(if_match_admits("W/\"abc\", \"abc\"", tag));
    assert!(if_match_admits("\"zzz\", \"abc\"", tag));
    assert!(if_match_admits("*", tag));
    assert!(!if_match_admits("\"zzz\"", tag));
  }
}
