use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user.
///
/// Name-only registrations (the quick-start flow) have neither email nor
/// password hash; full signups have both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: i64,
  pub name: String,
  pub email: Option<String>,
  #[serde(skip_serializing, default)]
  pub password_hash: Option<String>,
  pub created_at: DateTime<Utc>,
}
