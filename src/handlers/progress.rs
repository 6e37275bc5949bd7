//! Progress dashboard route.

use std::collections::HashMap;

use axum::{
  extract::{Query, State},
  response::IntoResponse,
  Json,
};
use serde_json::json;

use crate::db;
use crate::error::ApiError;
use crate::progress;
use crate::state::AppState;

pub async fn report(
  State(state): State<AppState>,
  Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
  let user_id = super::require_id_param(&params, "userId")?;
  let conn = db::try_lock(&state.db)?;
  let report = progress::aggregate(&conn, user_id)?;
  Ok(Json(json!({
    "success": true,
    "stats": report.stats,
    "topicPerformance": report.topics,
    "recentAttempts": report.recent_attempts,
  })))
}
