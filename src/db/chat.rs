use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Result, Row, params};

use crate::domain::{ChatMessage, ChatRole, ChatSession};

use super::users::parse_timestamp;

pub fn create_session(conn: &Connection, user_id: i64) -> Result<ChatSession> {
  let now = Utc::now();
  conn.execute(
    r#"
    INSERT INTO chat_sessions (user_id, title, created_at, last_message_at)
    VALUES (?1, 'New Chat', ?2, ?2)
    "#,
    params![user_id, now.to_rfc3339()],
  )?;
  Ok(ChatSession {
    id: conn.last_insert_rowid(),
    user_id,
    title: "New Chat".to_string(),
    created_at: now,
    last_message_at: now,
  })
}

pub fn get_session(conn: &Connection, id: i64) -> Result<Option<ChatSession>> {
  conn
    .query_row(
      "SELECT id, user_id, title, created_at, last_message_at FROM chat_sessions WHERE id = ?1",
      params![id],
      row_to_session,
    )
    .optional()
}

/// Sessions for a user, most recently active first.
pub fn list_sessions(conn: &Connection, user_id: i64) -> Result<Vec<ChatSession>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT id, user_id, title, created_at, last_message_at
    FROM chat_sessions
    WHERE user_id = ?1
    ORDER BY last_message_at DESC
    "#,
  )?;
  let sessions = stmt
    .query_map(params![user_id], row_to_session)?
    .collect::<Result<Vec<_>>>()?;
  Ok(sessions)
}

/// Delete a session and all of its messages.
pub fn delete_session(conn: &mut Connection, id: i64) -> Result<bool> {
  let tx = conn.transaction()?;
  tx.execute("DELETE FROM chat_messages WHERE session_id = ?1", params![id])?;
  let deleted = tx.execute("DELETE FROM chat_sessions WHERE id = ?1", params![id])?;
  tx.commit()?;
  Ok(deleted > 0)
}

pub fn insert_message(
  conn: &Connection,
  session_id: i64,
  role: ChatRole,
  content: &str,
) -> Result<ChatMessage> {
  let now = Utc::now();
  conn.execute(
    r#"
    INSERT INTO chat_messages (session_id, role, content, timestamp)
    VALUES (?1, ?2, ?3, ?4)
    "#,
    params![session_id, role.as_str(), content, now.to_rfc3339()],
  )?;
  Ok(ChatMessage {
    id: conn.last_insert_rowid(),
    session_id,
    role,
    content: content.to_string(),
    timestamp: now,
  })
}

/// Messages of a session in display order (oldest first).
pub fn list_messages(conn: &Connection, session_id: i64) -> Result<Vec<ChatMessage>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT id, session_id, role, content, timestamp
    FROM chat_messages
    WHERE session_id = ?1
    ORDER BY timestamp ASC, id ASC
    "#,
  )?;
  let messages = stmt
    .query_map(params![session_id], |row| {
      let role_raw: String = row.get(2)?;
      let role = ChatRole::from_str(&role_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
          2,
          rusqlite::types::Type::Text,
          format!("unknown chat role: {}", role_raw).into(),
        )
      })?;
      Ok(ChatMessage {
        id: row.get(0)?,
        session_id: row.get(1)?,
        role,
        content: row.get(3)?,
        timestamp: parse_timestamp(row, 4)?,
      })
    })?
    .collect::<Result<Vec<_>>>()?;
  Ok(messages)
}

pub fn count_messages(conn: &Connection, session_id: i64) -> Result<i64> {
  conn.query_row(
    "SELECT COUNT(*) FROM chat_messages WHERE session_id = ?1",
    params![session_id],
    |row| row.get(0),
  )
}

pub fn update_session_title(conn: &Connection, session_id: i64, title: &str) -> Result<()> {
  conn.execute(
    "UPDATE chat_sessions SET title = ?2 WHERE id = ?1",
    params![session_id, title],
  )?;
  Ok(())
}

/// Refresh the session's last-activity timestamp.
pub fn touch_session(conn: &Connection, session_id: i64) -> Result<()> {
  conn.execute(
    "UPDATE chat_sessions SET last_message_at = ?2 WHERE id = ?1",
    params![session_id, Utc::now().to_rfc3339()],
  )?;
  Ok(())
}

fn row_to_session(row: &Row) -> Result<ChatSession> {
  Ok(ChatSession {
    id: row.get(0)?,
    user_id: row.get(1)?,
    title: row.get(2)?,
    created_at: parse_timestamp(row, 3)?,
    last_message_at: parse_timestamp(row, 4)?,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::TestEnv;

  #[test]
  fn new_session_has_default_title() {
    let mut env = TestEnv::new().unwrap();
    let user_id = env.seed_user("Alice");
    let session = create_session(&env.conn, user_id).unwrap();
    assert_eq!(session.title, "New Chat");
    assert_eq!(session.created_at, session.last_message_at);
  }

  #[test]
  fn messages_ordered_oldest_first() {
    let mut env = TestEnv::new().unwrap();
    let user_id = env.seed_user("Alice");
    let session = create_session(&env.conn, user_id).unwrap();

    insert_message(&env.conn, session.id, ChatRole::User, "hello").unwrap();
    insert_message(&env.conn, session.id, ChatRole::Assistant, "hi there").unwrap();

    let messages = list_messages(&env.conn, session.id).unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, ChatRole::User);
    assert_eq!(messages[1].role, ChatRole::Assistant);
    assert_eq!(count_messages(&env.conn, session.id).unwrap(), 2);
  }

  #[test]
  fn delete_session_cascades_to_messages() {
    let mut env = TestEnv::new().unwrap();
    let user_id = env.seed_user("Alice");
    let session = create_session(&env.conn, user_id).unwrap();
    insert_message(&env.conn, session.id, ChatRole::User, "hello").unwrap();

    assert!(delete_session(&mut env.conn, session.id).unwrap());
    assert!(get_session(&env.conn, session.id).unwrap().is_none());
    assert_eq!(count_messages(&env.conn, session.id).unwrap(), 0);
  }

  #[test]
  fn delete_missing_session_reports_not_found() {
    let mut env = TestEnv::new().unwrap();
    assert!(!delete_session(&mut env.conn, 404).unwrap());
  }
}
