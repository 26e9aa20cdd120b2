//! [`SqliteStore`], the SQLite implementation of [`StudentStore`].

use std::path::Path;

use chrono::{DateTime, Duration, SubsecRound as _, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use scholar_core::{
  store::{StudentQuery, StudentStore},
  student::{NewStudent, Student},
};

use crate::{
  Error, Result,
  encode::{EncodedStudent, RawStudent, STUDENT_COLUMNS, encode_dt, encode_gender, encode_uuid},
  schema::SCHEMA,
};

const DEFAULT_LIMIT: usize = 100;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Scholar student store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// What happened to a conditional `UPDATE`.
enum SaveOutcome {
  Saved(RawStudent),
  Missing,
  Stale,
  DuplicateEmail,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// The `updated_at` to store on save: the merged timestamp at stored
/// precision, forced strictly past the version being replaced so every save
/// is observable.
fn next_version(merged: DateTime<Utc>, previous: DateTime<Utc>) -> DateTime<Utc> {
  merged
    .trunc_subsecs(6)
    .max(previous.trunc_subsecs(6) + Duration::microseconds(1))
}

/// `true` if `e` is a violation of a UNIQUE index. The only one on
/// `students` is the email index; primary-key clashes report a different
/// extended code.
/// SQLite takes signed paging values; a negative OFFSET counts as zero and a
/// negative LIMIT means unbounded, so saturate instead of wrapping.
fn clamp_i64(n: usize) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _)
      if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

/// Escape `%`, `_` and `\` so user text is matched literally by
/// `LIKE ... ESCAPE '\'`.
fn like_pattern(text: &str) -> String {
  let mut escaped = String::with_capacity(text.len() + 2);
  escaped.push('%');
  for c in text.chars() {
    if matches!(c, '%' | '_' | '\\') {
      escaped.push('\\');
    }
    escaped.push(c);
  }
  escaped.push('%');
  escaped
}

// ─── StudentStore impl ───────────────────────────────────────────────────────

impl StudentStore for SqliteStore {
  type Error = Error;

  async fn create(&self, input: NewStudent) -> Result<Student> {
    // Stored timestamps carry microseconds; truncate up front so the returned
    // record equals what a later read produces.
    let now = Utc::now().trunc_subsecs(6);
    let student = Student::create(Uuid::new_v4(), input, now)?;
    let row = EncodedStudent::from(&student);

    let inserted = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          &format!("INSERT INTO students ({STUDENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
          rusqlite::params![
            row.student_id,
            row.first_name,
            row.last_name,
            row.email,
            row.date_of_birth,
            row.gender,
            row.created_at,
            row.updated_at,
          ],
        );
        match result {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(scholar_core::Error::DuplicateEmail(student.email).into());
    }

    tracing::debug!(student_id = %student.id, "created student");
    Ok(student)
  }

  async fn get(&self, id: Uuid) -> Result<Option<Student>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawStudent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE student_id = ?1"),
              rusqlite::params![id_str],
              RawStudent::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawStudent::into_student).transpose()
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<Student>> {
    // Cleared addresses are not unique and identify nobody.
    if email.is_empty() {
      return Ok(None);
    }
    let email = email.to_owned();

    let raw: Option<RawStudent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE email = ?1"),
              rusqlite::params![email],
              RawStudent::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawStudent::into_student).transpose()
  }

  async fn list(&self, query: &StudentQuery) -> Result<Vec<Student>> {
    let text_pattern = query.text.as_deref().map(like_pattern);
    let gender_str   = query.gender.map(encode_gender);
    let limit_val    = clamp_i64(query.limit.unwrap_or(DEFAULT_LIMIT));
    let offset_val   = clamp_i64(query.offset.unwrap_or(0));

    let raws: Vec<RawStudent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {STUDENT_COLUMNS}
           FROM students
           WHERE (?1 IS NULL
                  OR first_name LIKE ?1 ESCAPE '\\'
                  OR last_name  LIKE ?1 ESCAPE '\\'
                  OR email      LIKE ?1 ESCAPE '\\')
             AND (?2 IS NULL OR gender = ?2)
           ORDER BY created_at, rowid
           LIMIT ?3 OFFSET ?4"
        ))?;

        let rows = stmt
          .query_map(
            rusqlite::params![text_pattern, gender_str, limit_val, offset_val],
            RawStudent::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStudent::into_student).collect()
  }

  async fn save(
    &self,
    student: &Student,
    expected_updated_at: DateTime<Utc>,
  ) -> Result<Student> {
    let id = student.id;
    let email = student.email.clone();
    let mut row = EncodedStudent::from(student);
    row.updated_at = encode_dt(next_version(student.audit.updated_at(), expected_updated_at));
    let expected_str = encode_dt(expected_updated_at);

    let outcome = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "UPDATE students
           SET first_name = ?2, last_name = ?3, email = ?4,
               date_of_birth = ?5, gender = ?6, updated_at = ?7
           WHERE student_id = ?1 AND updated_at = ?8",
          rusqlite::params![
            row.student_id,
            row.first_name,
            row.last_name,
            row.email,
            row.date_of_birth,
            row.gender,
            row.updated_at,
            expected_str,
          ],
        );

        let outcome = match result {
          Ok(0) => {
            let exists = conn
              .query_row(
                "SELECT 1 FROM students WHERE student_id = ?1",
                rusqlite::params![row.student_id],
                |_| Ok(true),
              )
              .optional()?
              .unwrap_or(false);
            if exists { SaveOutcome::Stale } else { SaveOutcome::Missing }
          }
          Ok(_) => SaveOutcome::Saved(conn.query_row(
            &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE student_id = ?1"),
            rusqlite::params![row.student_id],
            RawStudent::from_row,
          )?),
          Err(e) if is_unique_violation(&e) => SaveOutcome::DuplicateEmail,
          Err(e) => return Err(e.into()),
        };
        Ok(outcome)
      })
      .await?;

    match outcome {
      SaveOutcome::Saved(raw) => {
        tracing::debug!(student_id = %id, "saved student");
        raw.into_student()
      }
      SaveOutcome::Missing => Err(scholar_core::Error::StudentNotFound(id).into()),
      SaveOutcome::Stale => Err(scholar_core::Error::StaleWrite(id).into()),
      SaveOutcome::DuplicateEmail => Err(scholar_core::Error::DuplicateEmail(email).into()),
    }
  }

  async fn delete(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "DELETE FROM students WHERE student_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(n > 0)
      })
      .await?;

    if deleted {
      tracing::debug!(student_id = %id, "deleted student");
    }
    Ok(deleted)
  }
}
