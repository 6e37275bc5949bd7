//! Attempt history routes.

use axum::{
  extract::{Path, State},
  response::IntoResponse,
  Json,
};
use serde_json::json;

use crate::db;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn get_attempt(
  State(state): State<AppState>,
  Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
  let conn = db::try_lock(&state.db)?;
  let attempt = db::get_attempt(&conn, id)?
    .ok_or_else(|| ApiError::not_found("Attempt not found"))?;
  Ok(Json(json!({
    "success": true,
    "attempt": attempt,
  })))
}
