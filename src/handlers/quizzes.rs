//! Quiz lifecycle routes: generation, retrieval, submission, reattempt.

use std::collections::HashMap;

use axum::{
  extract::{Multipart, Path, Query, State},
  response::IntoResponse,
  Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::config;
use crate::db;
use crate::error::ApiError;
use crate::grading::{self, SubmittedAnswer};
use crate::ingest::{self, PdfSource};
use crate::quizgen::{QuizConfig, QuizTypes};
use crate::state::AppState;

struct GenerateForm {
  user_id: Option<i64>,
  pdf_source: Option<String>,
  types: Option<QuizTypes>,
  counts: Option<crate::domain::QuizCounts>,
  pdf_file: Option<(Vec<u8>, String, String)>,
}

async fn read_generate_form(mut multipart: Multipart) -> Result<GenerateForm, ApiError> {
  let mut form = GenerateForm {
    user_id: None,
    pdf_source: None,
    types: None,
    counts: None,
    pdf_file: None,
  };

  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| ApiError::validation(format!("Malformed multipart body: {e}")))?
  {
    let name = field.name().unwrap_or_default().to_string();
    match name.as_str() {
      "userId" => {
        let text = field.text().await.map_err(bad_field)?;
        form.user_id = text.trim().parse().ok();
      }
      "pdfSource" => {
        form.pdf_source = Some(field.text().await.map_err(bad_field)?);
      }
      "quizTypes" => {
        let text = field.text().await.map_err(bad_field)?;
        form.types = Some(
          serde_json::from_str(&text)
            .map_err(|_| ApiError::validation("Invalid quizTypes"))?,
        );
      }
      "numberOfQuestions" => {
        let text = field.text().await.map_err(bad_field)?;
        form.counts = Some(
          serde_json::from_str(&text)
            .map_err(|_| ApiError::validation("Invalid numberOfQuestions"))?,
        );
      }
      "pdfFile" => {
        let mime = field
          .content_type()
          .unwrap_or("application/octet-stream")
          .to_string();
        let filename = field.file_name().unwrap_or("upload.pdf").to_string();
        let bytes = field.bytes().await.map_err(bad_field)?;
        form.pdf_file = Some((bytes.to_vec(), filename, mime));
      }
      _ => {}
    }
  }

  Ok(form)
}

fn bad_field(e: axum::extract::multipart::MultipartError) -> ApiError {
  ApiError::validation(format!("Malformed multipart field: {e}"))
}

fn resolve_source(state: &AppState, form: &mut GenerateForm) -> Result<(PdfSource, String), ApiError> {
  let identifier = form
    .pdf_source
    .clone()
    .ok_or_else(|| ApiError::validation("pdfSource is required"))?;

  if identifier == "upload" {
    let (bytes, filename, mime_type) = form
      .pdf_file
      .take()
      .ok_or_else(|| ApiError::validation("pdfFile is required for uploads"))?;
    let source_label = filename.clone();
    Ok((PdfSource::Upload { bytes, filename, mime_type }, source_label))
  } else {
    let path = state
      .preloaded_pdf_path(&identifier)
      .ok_or_else(|| ApiError::validation("Invalid pdfSource"))?;
    Ok((PdfSource::Preloaded { path }, identifier))
  }
}

pub async fn generate(
  State(state): State<AppState>,
  multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
  let mut form = read_generate_form(multipart).await?;

  let user_id = form
    .user_id
    .ok_or_else(|| ApiError::validation("userId is required"))?;
  let quiz_config = QuizConfig {
    types: form
      .types
      .ok_or_else(|| ApiError::validation("quizTypes is required"))?,
    counts: form
      .counts
      .ok_or_else(|| ApiError::validation("numberOfQuestions is required"))?,
  };
  let counts = quiz_config.effective_counts()?;

  {
    let conn = db::try_lock(&state.db)?;
    db::get_user_by_id(&conn, user_id)?
      .ok_or_else(|| ApiError::not_found("User not found"))?;
  }

  let (source, source_label) = resolve_source(&state, &mut form)?;

  let document = ingest::ingest(
    &state.gemini,
    &state.temp_dir,
    source,
    config::QUIZ_POLL_INTERVAL,
  )
  .await?;
  let result = crate::quizgen::generate(&state.gemini, counts, &document).await;
  ingest::discard(&state.gemini, &document.remote_name).await;
  let quiz = result?;

  let title = quiz
    .title
    .unwrap_or_else(|| format!("Quiz on {source_label}"));

  let quiz_id = {
    let mut conn = db::try_lock(&state.db)?;
    db::insert_quiz_with_questions(
      &mut conn,
      user_id,
      &title,
      &source_label,
      counts,
      &quiz.questions,
    )?
  };

  tracing::info!(quiz_id, total = counts.total(), "Generated quiz");

  Ok(Json(json!({
    "success": true,
    "savedQuizId": quiz_id,
    "quizTitle": title,
    "totalQuestions": counts.total(),
  })))
}

pub async fn get_quiz(
  State(state): State<AppState>,
  Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
  let conn = db::try_lock(&state.db)?;
  let quiz = db::get_saved_quiz(&conn, id)?
    .ok_or_else(|| ApiError::not_found("Quiz not found"))?;
  let questions = db::get_quiz_questions(&conn, id)?;
  if questions.is_empty() {
    return Err(ApiError::not_found("Quiz data not found"));
  }

  Ok(Json(json!({
    "success": true,
    "quiz": quiz,
    "questions": questions,
  })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
  pub user_id: i64,
  #[serde(default)]
  pub answers: Vec<SubmittedAnswer>,
  #[serde(default)]
  pub time_taken: Option<i64>,
}

pub async fn submit(
  State(state): State<AppState>,
  Path(id): Path<i64>,
  Json(req): Json<SubmitRequest>,
) -> Result<impl IntoResponse, ApiError> {
  let summary = {
    let mut conn = db::try_lock(&state.db)?;
    grading::submit(&mut conn, id, req.user_id, &req.answers, req.time_taken)?
  };

  Ok(Json(json!({
    "success": true,
    "attemptId": summary.attempt_id,
    "score": summary.score,
    "totalMarks": summary.total_marks,
    "percentage": summary.percentage,
    "correctAnswers": summary.correct_answers,
    "incorrectAnswers": summary.incorrect_answers,
  })))
}

pub async fn reattempt(
  State(state): State<AppState>,
  Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
  let conn = db::try_lock(&state.db)?;
  if !db::reset_quiz_completion(&conn, id)? {
    return Err(ApiError::not_found("Quiz not found"));
  }
  Ok(Json(json!({
    "success": true,
    "message": "Quiz reset for reattempt",
  })))
}

pub async fn list_saved(
  State(state): State<AppState>,
  Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
  let user_id = super::require_id_param(&params, "userId")?;
  let conn = db::try_lock(&state.db)?;
  let quizzes = db::list_saved_quizzes(&conn, user_id)?;
  Ok(Json(json!({
    "success": true,
    "quizzes": quizzes,
  })))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn resolve_source_rejects_traversal() {
    let state = crate::testing::http_state();
    let mut form = GenerateForm {
      user_id: Some(1),
      pdf_source: Some("/pdfs/../../etc/passwd".into()),
      types: None,
      counts: None,
      pdf_file: None,
    };
    assert!(resolve_source(&state, &mut form).is_err());
  }

  #[test]
  fn resolve_source_upload_requires_file() {
    let state = crate::testing::http_state();
    let mut form = GenerateForm {
      user_id: Some(1),
      pdf_source: Some("upload".into()),
      types: None,
      counts: None,
      pdf_file: None,
    };
    let err = resolve_source(&state, &mut form).unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
  }
}
