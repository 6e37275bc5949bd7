use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Result, Row, params};

use crate::domain::User;

pub fn insert_user(
  conn: &Connection,
  name: &str,
  email: Option<&str>,
  password_hash: Option<&str>,
) -> Result<i64> {
  conn.execute(
    r#"
    INSERT INTO users (name, email, password_hash, created_at)
    VALUES (?1, ?2, ?3, ?4)
    "#,
    params![name, email, password_hash, Utc::now().to_rfc3339()],
  )?;
  Ok(conn.last_insert_rowid())
}

pub fn get_user_by_id(conn: &Connection, id: i64) -> Result<Option<User>> {
  conn
    .query_row(
      "SELECT id, name, email, password_hash, created_at FROM users WHERE id = ?1",
      params![id],
      row_to_user,
    )
    .optional()
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
  conn
    .query_row(
      "SELECT id, name, email, password_hash, created_at FROM users WHERE email = ?1",
      params![email],
      row_to_user,
    )
    .optional()
}

pub fn email_exists(conn: &Connection, email: &str) -> Result<bool> {
  let count: i64 = conn.query_row(
    "SELECT COUNT(*) FROM users WHERE email = ?1",
    params![email],
    |row| row.get(0),
  )?;
  Ok(count > 0)
}

fn row_to_user(row: &Row) -> Result<User> {
  Ok(User {
    id: row.get(0)?,
    name: row.get(1)?,
    email: row.get(2)?,
    password_hash: row.get(3)?,
    created_at: parse_timestamp(row, 4)?,
  })
}

/// Parse an RFC3339 column into a UTC timestamp
pub(crate) fn parse_timestamp(row: &Row, idx: usize) -> Result<DateTime<Utc>> {
  let raw: String = row.get(idx)?;
  DateTime::parse_from_rfc3339(&raw)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| {
      rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::TestEnv;

  #[test]
  fn insert_and_fetch_user() {
    let env = TestEnv::new().unwrap();
    let id = insert_user(&env.conn, "Alice", Some("alice@example.com"), Some("h")).unwrap();

    let user = get_user_by_id(&env.conn, id).unwrap().unwrap();
    assert_eq!(user.name, "Alice");
    assert_eq!(user.email.as_deref(), Some("alice@example.com"));

    let by_email = get_user_by_email(&env.conn, "alice@example.com").unwrap();
    assert_eq!(by_email.unwrap().id, id);
  }

  #[test]
  fn name_only_user_has_no_credentials() {
    let env = TestEnv::new().unwrap();
    let id = insert_user(&env.conn, "Bob", None, None).unwrap();
    let user = get_user_by_id(&env.conn, id).unwrap().unwrap();
    assert!(user.email.is_none());
    assert!(user.password_hash.is_none());
  }

  #[test]
  fn email_lookup_is_case_insensitive() {
    let env = TestEnv::new().unwrap();
    insert_user(&env.conn, "Cara", Some("cara@example.com"), Some("h")).unwrap();
    assert!(email_exists(&env.conn, "Cara@Example.com").unwrap());
  }
}
