//! SQL schema for the Scholar SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
///
/// Timestamps are fixed-width RFC 3339 (microseconds, `Z`), so string
/// comparison orders them chronologically.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS students (
    student_id    TEXT PRIMARY KEY,
    first_name    TEXT NOT NULL,
    last_name     TEXT NOT NULL,
    email         TEXT NOT NULL COLLATE NOCASE,  -- '' when cleared
    date_of_birth TEXT,                          -- YYYY-MM-DD or NULL
    gender        TEXT CHECK (gender IN ('MALE', 'FEMALE', 'OTHER')),
    created_at    TEXT NOT NULL,                 -- server-assigned, immutable
    updated_at    TEXT NOT NULL,                 -- refreshed on every save
    CHECK (updated_at >= created_at)
);

-- Cleared addresses may repeat; real ones may not.
CREATE UNIQUE INDEX IF NOT EXISTS students_email_idx
    ON students(email) WHERE email <> '';
CREATE INDEX IF NOT EXISTS students_created_idx ON students(created_at);

PRAGMA user_version = 1;
";
