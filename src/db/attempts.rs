use rusqlite::{Connection, OptionalExtension, Result, Row, params};

use crate::domain::QuizAttempt;

use super::users::parse_timestamp;

/// 1 + number of prior attempts for this (user, quiz) pair.
pub fn next_attempt_number(conn: &Connection, user_id: i64, quiz_id: i64) -> Result<u32> {
  let prior: i64 = conn.query_row(
    "SELECT COUNT(*) FROM quiz_attempts WHERE user_id = ?1 AND quiz_id = ?2",
    params![user_id, quiz_id],
    |row| row.get(0),
  )?;
  Ok(prior as u32 + 1)
}

/// Persist the attempt and update the quiz's completion state atomically.
///
/// Returns the new attempt id. The quiz-update half runs in the same
/// transaction so a crash cannot leave a scored attempt with a quiz still
/// marked incomplete.
pub fn record_attempt(conn: &mut Connection, attempt: &QuizAttempt) -> Result<i64> {
  let answers_json = serde_json::to_string(&attempt.answers)
    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

  let tx = conn.transaction()?;

  tx.execute(
    r#"
    INSERT INTO quiz_attempts
      (user_id, quiz_id, quiz_title, pdf_source, total_questions,
       total_marks, earned_marks, percentage, correct_answers,
       incorrect_answers, answers_json, attempt_number, completed_at, time_taken)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
    "#,
    params![
      attempt.user_id,
      attempt.saved_quiz_id,
      attempt.quiz_title,
      attempt.pdf_source,
      attempt.total_questions,
      attempt.total_marks,
      attempt.earned_marks,
      attempt.percentage,
      attempt.correct_answers,
      attempt.incorrect_answers,
      answers_json,
      attempt.attempt_number,
      attempt.completed_at.to_rfc3339(),
      attempt.time_taken,
    ],
  )?;
  let attempt_id = tx.last_insert_rowid();

  super::quizzes::complete_quiz(
    &tx,
    attempt.saved_quiz_id,
    attempt.earned_marks,
    attempt_id,
    attempt.completed_at,
  )?;

  tx.commit()?;
  Ok(attempt_id)
}

pub fn get_attempt(conn: &Connection, id: i64) -> Result<Option<QuizAttempt>> {
  conn
    .query_row(
      &format!("{} WHERE id = ?1", SELECT_ATTEMPT),
      params![id],
      row_to_attempt,
    )
    .optional()
}

/// All attempts for a user, most recent first.
pub fn list_attempts(conn: &Connection, user_id: i64) -> Result<Vec<QuizAttempt>> {
  let mut stmt = conn.prepare(&format!(
    "{} WHERE user_id = ?1 ORDER BY completed_at DESC, id DESC",
    SELECT_ATTEMPT
  ))?;
  let attempts = stmt
    .query_map(params![user_id], row_to_attempt)?
    .collect::<Result<Vec<_>>>()?;
  Ok(attempts)
}

const SELECT_ATTEMPT: &str = r#"
  SELECT id, user_id, quiz_id, quiz_title, pdf_source, total_questions,
         total_marks, earned_marks, percentage, correct_answers,
         incorrect_answers, answers_json, attempt_number, completed_at, time_taken
  FROM quiz_attempts
"#;

fn row_to_attempt(row: &Row) -> Result<QuizAttempt> {
  let answers_json: String = row.get(11)?;
  let answers = serde_json::from_str(&answers_json).map_err(|e| {
    rusqlite::Error::FromSqlConversionFailure(11, rusqlite::types::Type::Text, Box::new(e))
  })?;

  Ok(QuizAttempt {
    id: row.get(0)?,
    user_id: row.get(1)?,
    saved_quiz_id: row.get(2)?,
    quiz_title: row.get(3)?,
    pdf_source: row.get(4)?,
    total_questions: row.get(5)?,
    total_marks: row.get(6)?,
    earned_marks: row.get(7)?,
    percentage: row.get(8)?,
    correct_answers: row.get(9)?,
    incorrect_answers: row.get(10)?,
    answers,
    attempt_number: row.get(12)?,
    completed_at: parse_timestamp(row, 13)?,
    time_taken: row.get(14)?,
  })
}
