//! Database schema with version-gated migrations.
//!
//! Each migration:
//! 1. Checks if the current schema version is less than the target version
//! 2. Runs the migration SQL
//! 3. Records the new version in `db_version`
//!
//! Migrations only run once - the version check ensures idempotency.

use rusqlite::{Connection, OptionalExtension, Result, params};

/// Current schema version.
/// Increment this when adding a new migration.
pub const DB_VERSION: i32 = 1;

pub fn run_migrations(conn: &Connection) -> Result<()> {
  // Bootstrap: ensure db_version table exists (needed to check version)
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS db_version (
      version INTEGER PRIMARY KEY,
      applied_at TEXT NOT NULL,
      description TEXT
    );
    "#,
  )?;

  let current_version = get_schema_version(conn)?;
  tracing::debug!("schema version: {}", current_version);

  if current_version < 1 {
    migrate_v0_to_v1(conn)?;
  }

  Ok(())
}

/// v0→v1: Create base tables
fn migrate_v0_to_v1(conn: &Connection) -> Result<()> {
  tracing::info!("Running migration v0→v1: Create base tables");

  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS users (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      name TEXT NOT NULL,
      email TEXT UNIQUE COLLATE NOCASE,
      password_hash TEXT,
      created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS saved_quizzes (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      user_id INTEGER NOT NULL,
      title TEXT NOT NULL,
      pdf_source TEXT NOT NULL,
      num_mcq INTEGER NOT NULL,
      num_saq INTEGER NOT NULL,
      num_laq INTEGER NOT NULL,
      total_questions INTEGER NOT NULL,
      is_completed INTEGER NOT NULL DEFAULT 0,
      score INTEGER,
      attempt_id INTEGER,
      created_at TEXT NOT NULL,
      completed_at TEXT,
      FOREIGN KEY (user_id) REFERENCES users(id)
    );

    CREATE TABLE IF NOT EXISTS quiz_questions (
      quiz_id INTEGER NOT NULL,
      question_id INTEGER NOT NULL,
      question_type TEXT NOT NULL,
      question TEXT NOT NULL,
      options_json TEXT,
      correct_answer TEXT NOT NULL,
      explanation TEXT NOT NULL,
      marks INTEGER NOT NULL,
      PRIMARY KEY (quiz_id, question_id),
      FOREIGN KEY (quiz_id) REFERENCES saved_quizzes(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS quiz_attempts (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      user_id INTEGER NOT NULL,
      quiz_id INTEGER NOT NULL,
      quiz_title TEXT NOT NULL,
      pdf_source TEXT NOT NULL,
      total_questions INTEGER NOT NULL,
      total_marks INTEGER NOT NULL,
      earned_marks INTEGER NOT NULL,
      percentage REAL NOT NULL,
      correct_answers INTEGER NOT NULL,
      incorrect_answers INTEGER NOT NULL,
      answers_json TEXT NOT NULL,
      attempt_number INTEGER NOT NULL,
      completed_at TEXT NOT NULL,
      time_taken INTEGER,
      FOREIGN KEY (user_id) REFERENCES users(id),
      FOREIGN KEY (quiz_id) REFERENCES saved_quizzes(id)
    );

    CREATE TABLE IF NOT EXISTS chat_sessions (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      user_id INTEGER NOT NULL,
      title TEXT NOT NULL DEFAULT 'New Chat',
      created_at TEXT NOT NULL,
      last_message_at TEXT NOT NULL,
      FOREIGN KEY (user_id) REFERENCES users(id)
    );

    CREATE TABLE IF NOT EXISTS chat_messages (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      session_id INTEGER NOT NULL,
      role TEXT NOT NULL,
      content TEXT NOT NULL,
      timestamp TEXT NOT NULL,
      FOREIGN KEY (session_id) REFERENCES chat_sessions(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_saved_quizzes_user ON saved_quizzes(user_id);
    CREATE INDEX IF NOT EXISTS idx_attempts_user ON quiz_attempts(user_id);
    CREATE INDEX IF NOT EXISTS idx_attempts_user_quiz ON quiz_attempts(user_id, quiz_id);
    CREATE INDEX IF NOT EXISTS idx_sessions_user ON chat_sessions(user_id);
    CREATE INDEX IF NOT EXISTS idx_messages_session ON chat_messages(session_id);
    "#,
  )?;

  record_version(conn, 1, "Create base tables")?;
  Ok(())
}

fn get_schema_version(conn: &Connection) -> Result<i32> {
  let version: Option<i32> = conn
    .query_row("SELECT MAX(version) FROM db_version", [], |row| row.get(0))
    .optional()?
    .flatten();
  Ok(version.unwrap_or(0))
}

fn record_version(conn: &Connection, version: i32, description: &str) -> Result<()> {
  conn.execute(
    "INSERT INTO db_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
    params![version, chrono::Utc::now().to_rfc3339(), description],
  )?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn migrations_are_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    run_migrations(&conn).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), DB_VERSION);
  }

  #[test]
  fn fresh_db_has_all_tables() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    for table in [
      "users",
      "saved_quizzes",
      "quiz_questions",
      "quiz_attempts",
      "chat_sessions",
      "chat_messages",
    ] {
      let count: i64 = conn
        .query_row(
          "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
          [table],
          |row| row.get(0),
        )
        .unwrap();
      assert_eq!(count, 1, "missing table {}", table);
    }
  }
}
