//! The `StudentStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `scholar-store-sqlite`).
//! Higher layers (`scholar-api`) depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::student::{Gender, NewStudent, Student};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`StudentStore::list`].
#[derive(Debug, Clone, Default)]
pub struct StudentQuery {
  /// Case-insensitive substring matched against names and email.
  pub text:   Option<String>,
  pub gender: Option<Gender>,
  /// Defaults to 100.
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Backend errors that may wrap a domain failure (duplicate email, stale
/// write, ...). Lets callers react to those without knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The domain error behind this one, if there is one.
  fn as_core(&self) -> Option<&crate::Error>;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a student store backend.
///
/// The store owns identifier assignment, creation timestamps and email
/// uniqueness. Merging updates is done by the caller with
/// [`crate::patch::merge`]; the store only persists the result.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait StudentStore: Send + Sync {
  type Error: StoreError;

  /// Validate and persist a new student. The store assigns `id` and both
  /// audit timestamps.
  fn create(
    &self,
    input: NewStudent,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + '_;

  /// Retrieve a student by id. Returns `None` if not found.
  fn get(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + '_;

  /// Retrieve a student by email address (case-insensitive).
  fn find_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + 'a;

  /// List students matching `query`, oldest first.
  fn list<'a>(
    &'a self,
    query: &'a StudentQuery,
  ) -> impl Future<Output = Result<Vec<Student>, Self::Error>> + Send + 'a;

  /// Persist an updated student.
  ///
  /// `expected_updated_at` is the `updated_at` the caller read before
  /// merging. The write only happens if the stored value still equals it;
  /// otherwise the store reports a stale write. Returns the saved record.
  fn save<'a>(
    &'a self,
    student: &'a Student,
    expected_updated_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + 'a;

  /// Delete a student. Returns `false` if there was nothing to delete.
  fn delete(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
