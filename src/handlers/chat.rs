//! Chat session and message routes.

use std::collections::HashMap;

use axum::{
  extract::{Multipart, Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::chat;
use crate::db;
use crate::error::ApiError;
use crate::ingest::PdfSource;
use crate::state::AppState;

pub async fn list_sessions(
  State(state): State<AppState>,
  Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
  let user_id = super::require_id_param(&params, "userId")?;
  let conn = db::try_lock(&state.db)?;
  let sessions = db::list_sessions(&conn, user_id)?;
  Ok(Json(json!({
    "success": true,
    "sessions": sessions,
  })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
  pub user_id: i64,
}

pub async fn create_session(
  State(state): State<AppState>,
  Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
  let conn = db::try_lock(&state.db)?;
  db::get_user_by_id(&conn, req.user_id)?
    .ok_or_else(|| ApiError::not_found("User not found"))?;
  let session = db::create_session(&conn, req.user_id)?;
  Ok((
    StatusCode::CREATED,
    Json(json!({
      "success": true,
      "session": session,
    })),
  ))
}

pub async fn delete_session(
  State(state): State<AppState>,
  Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
  let session_id = super::require_id_param(&params, "sessionId")?;
  let mut conn = db::try_lock(&state.db)?;
  if !db::delete_session(&mut conn, session_id)? {
    return Err(ApiError::not_found("Chat session not found"));
  }
  Ok(Json(json!({
    "success": true,
    "message": "Chat session deleted",
  })))
}

pub async fn list_messages(
  State(state): State<AppState>,
  Path(session_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
  let conn = db::try_lock(&state.db)?;
  db::get_session(&conn, session_id)?
    .ok_or_else(|| ApiError::not_found("Chat session not found"))?;
  let messages = db::list_messages(&conn, session_id)?;
  Ok(Json(json!({
    "success": true,
    "messages": messages,
  })))
}

struct MessageForm {
  content: Option<String>,
  pdf_file: Option<(Vec<u8>, String, String)>,
}

async fn read_message_form(mut multipart: Multipart) -> Result<MessageForm, ApiError> {
  let mut form = MessageForm { content: None, pdf_file: None };

  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| ApiError::validation(format!("Malformed multipart body: {e}")))?
  {
    let name = field.name().unwrap_or_default().to_string();
    match name.as_str() {
      "content" => {
        form.content = Some(
          field
            .text()
            .await
            .map_err(|e| ApiError::validation(format!("Malformed multipart field: {e}")))?,
        );
      }
      "pdfFile" => {
        let mime = field
          .content_type()
          .unwrap_or("application/octet-stream")
          .to_string();
        let filename = field.file_name().unwrap_or("upload.pdf").to_string();
        let bytes = field
          .bytes()
          .await
          .map_err(|e| ApiError::validation(format!("Malformed multipart field: {e}")))?;
        form.pdf_file = Some((bytes.to_vec(), filename, mime));
      }
      _ => {}
    }
  }

  Ok(form)
}

pub async fn post_message(
  State(state): State<AppState>,
  Path(session_id): Path<i64>,
  multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
  let form = read_message_form(multipart).await?;

  let content = form
    .content
    .ok_or_else(|| ApiError::validation("content is required"))?;
  let pdf = form
    .pdf_file
    .map(|(bytes, filename, mime_type)| PdfSource::Upload { bytes, filename, mime_type });

  let turn = chat::respond(&state, session_id, &content, pdf).await?;

  Ok(Json(json!({
    "success": true,
    "userMessage": turn.user_message,
    "aiMessage": turn.assistant_message,
    "title": turn.title,
  })))
}
