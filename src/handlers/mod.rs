pub mod attempts;
pub mod chat;
pub mod progress;
pub mod quizzes;

use std::collections::HashMap;

use axum::{
  http::StatusCode,
  response::IntoResponse,
  routing::{get, post},
  Json, Router,
};
use serde_json::json;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::error::ApiError;
use crate::state::AppState;

/// Pull a required numeric id out of the query string. Extracting the raw
/// map keeps missing and malformed values on the uniform JSON error body
/// instead of the extractor's plain-text rejection.
fn require_id_param(params: &HashMap<String, String>, name: &str) -> Result<i64, ApiError> {
  params
    .get(name)
    .ok_or_else(|| ApiError::validation(format!("Missing {name} query parameter")))?
    .parse()
    .map_err(|_| ApiError::validation(format!("Invalid {name} query parameter")))
}

/// Assemble the full route table over the shared state.
pub fn router(state: AppState) -> Router {
  let public_dir = state.public_dir.clone();
  Router::new()
    .route("/users", post(auth::register))
    .route("/auth/signup", post(auth::signup))
    .route("/auth/login", post(auth::login))
    .route("/quizzes/generate", post(quizzes::generate))
    .route("/quizzes/saved", get(quizzes::list_saved))
    .route("/quizzes/{id}", get(quizzes::get_quiz))
    .route("/quizzes/{id}/submit", post(quizzes::submit))
    .route("/quizzes/{id}/reattempt", post(quizzes::reattempt))
    .route("/attempt/{id}", get(attempts::get_attempt))
    .route("/progress", get(progress::report))
    .route(
      "/chat/sessions",
      get(chat::list_sessions)
        .post(chat::create_session)
        .delete(chat::delete_session),
    )
    .route(
      "/chat/{session_id}/messages",
      get(chat::list_messages).post(chat::post_message),
    )
    .nest_service("/public", ServeDir::new(public_dir))
    .fallback(not_found)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

async fn not_found() -> impl IntoResponse {
  (
    StatusCode::NOT_FOUND,
    Json(json!({ "success": false, "error": "Route not found" })),
  )
}
