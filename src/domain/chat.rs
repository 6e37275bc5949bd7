use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
  User,
  Assistant,
}

impl ChatRole {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "user" => Some(Self::User),
      "assistant" => Some(Self::Assistant),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::User => "user",
      Self::Assistant => "assistant",
    }
  }
}

/// A chat conversation. Deleting a session deletes its messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
  pub id: i64,
  pub user_id: i64,
  /// Derived from the first user message after the first exchange
  pub title: String,
  pub created_at: DateTime<Utc>,
  pub last_message_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
  pub id: i64,
  pub session_id: i64,
  pub role: ChatRole,
  pub content: String,
  pub timestamp: DateTime<Utc>,
}
