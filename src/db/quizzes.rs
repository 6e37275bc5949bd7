use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Result, Row, params};

use crate::domain::{Question, QuestionType, QuizCounts, SavedQuiz};

use super::users::parse_timestamp;

/// Persist quiz metadata and its question set atomically.
///
/// A failure inserting any question rolls back the metadata row, so the
/// store never holds a quiz without its questions.
pub fn insert_quiz_with_questions(
  conn: &mut Connection,
  user_id: i64,
  title: &str,
  pdf_source: &str,
  counts: QuizCounts,
  questions: &[Question],
) -> Result<i64> {
  let tx = conn.transaction()?;

  tx.execute(
    r#"
    INSERT INTO saved_quizzes
      (user_id, title, pdf_source, num_mcq, num_saq, num_laq,
       total_questions, is_completed, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8)
    "#,
    params![
      user_id,
      title,
      pdf_source,
      counts.mcq,
      counts.saq,
      counts.laq,
      counts.total(),
      Utc::now().to_rfc3339(),
    ],
  )?;
  let quiz_id = tx.last_insert_rowid();

  for q in questions {
    let options_json = match &q.options {
      Some(opts) => Some(serde_json::to_string(opts).map_err(|e| {
        rusqlite::Error::ToSqlConversionFailure(Box::new(e))
      })?),
      None => None,
    };
    tx.execute(
      r#"
      INSERT INTO quiz_questions
        (quiz_id, question_id, question_type, question, options_json,
         correct_answer, explanation, marks)
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
      "#,
      params![
        quiz_id,
        q.id,
        q.question_type.as_str(),
        q.question,
        options_json,
        q.correct_answer,
        q.explanation,
        q.marks,
      ],
    )?;
  }

  tx.commit()?;
  Ok(quiz_id)
}

pub fn get_saved_quiz(conn: &Connection, id: i64) -> Result<Option<SavedQuiz>> {
  conn
    .query_row(
      &format!("{} WHERE id = ?1", SELECT_QUIZ),
      params![id],
      row_to_quiz,
    )
    .optional()
}

pub fn list_saved_quizzes(conn: &Connection, user_id: i64) -> Result<Vec<SavedQuiz>> {
  let mut stmt = conn.prepare(&format!(
    "{} WHERE user_id = ?1 ORDER BY created_at DESC",
    SELECT_QUIZ
  ))?;
  let quizzes = stmt
    .query_map(params![user_id], row_to_quiz)?
    .collect::<Result<Vec<_>>>()?;
  Ok(quizzes)
}

/// Ordered question set of a quiz (1:1 with the saved quiz by id).
pub fn get_quiz_questions(conn: &Connection, quiz_id: i64) -> Result<Vec<Question>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT question_id, question_type, question, options_json,
           correct_answer, explanation, marks
    FROM quiz_questions
    WHERE quiz_id = ?1
    ORDER BY question_id ASC
    "#,
  )?;

  let questions = stmt
    .query_map(params![quiz_id], |row| {
      let type_raw: String = row.get(1)?;
      let question_type = QuestionType::from_str(&type_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
          1,
          rusqlite::types::Type::Text,
          format!("unknown question type: {}", type_raw).into(),
        )
      })?;
      let options_json: Option<String> = row.get(3)?;
      let options = match options_json {
        Some(raw) => Some(serde_json::from_str(&raw).map_err(|e| {
          rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            Box::new(e),
          )
        })?),
        None => None,
      };
      Ok(Question {
        id: row.get(0)?,
        question_type,
        question: row.get(2)?,
        options,
        correct_answer: row.get(4)?,
        explanation: row.get(5)?,
        marks: row.get(6)?,
      })
    })?
    .collect::<Result<Vec<_>>>()?;
  Ok(questions)
}

/// Mark a quiz completed with its latest score and attempt back-reference.
pub fn complete_quiz(
  conn: &Connection,
  quiz_id: i64,
  score: i64,
  attempt_id: i64,
  completed_at: DateTime<Utc>,
) -> Result<()> {
  conn.execute(
    r#"
    UPDATE saved_quizzes
    SET is_completed = 1, score = ?2, attempt_id = ?3, completed_at = ?4
    WHERE id = ?1
    "#,
    params![quiz_id, score, attempt_id, completed_at.to_rfc3339()],
  )?;
  Ok(())
}

/// Clear completion state for a reattempt. Historical attempts are kept.
pub fn reset_quiz_completion(conn: &Connection, quiz_id: i64) -> Result<bool> {
  let updated = conn.execute(
    r#"
    UPDATE saved_quizzes
    SET is_completed = 0, score = NULL, attempt_id = NULL, completed_at = NULL
    WHERE id = ?1
    "#,
    params![quiz_id],
  )?;
  Ok(updated > 0)
}

pub fn count_quizzes(conn: &Connection, user_id: i64) -> Result<(i64, i64)> {
  let total: i64 = conn.query_row(
    "SELECT COUNT(*) FROM saved_quizzes WHERE user_id = ?1",
    params![user_id],
    |row| row.get(0),
  )?;
  let completed: i64 = conn.query_row(
    "SELECT COUNT(*) FROM saved_quizzes WHERE user_id = ?1 AND is_completed = 1",
    params![user_id],
    |row| row.get(0),
  )?;
  Ok((total, completed))
}

const SELECT_QUIZ: &str = r#"
  SELECT id, user_id, title, pdf_source, num_mcq, num_saq, num_laq,
         total_questions, is_completed, score, attempt_id, created_at, completed_at
  FROM saved_quizzes
"#;

fn row_to_quiz(row: &Row) -> Result<SavedQuiz> {
  let completed_at_raw: Option<String> = row.get(12)?;
  let completed_at = match completed_at_raw {
    Some(raw) => Some(
      chrono::DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| {
          rusqlite::Error::FromSqlConversionFailure(
            12,
            rusqlite::types::Type::Text,
            Box::new(e),
          )
        })?,
    ),
    None => None,
  };

  Ok(SavedQuiz {
    id: row.get(0)?,
    user_id: row.get(1)?,
    title: row.get(2)?,
    pdf_source: row.get(3)?,
    number_of_questions: QuizCounts {
      mcq: row.get(4)?,
      saq: row.get(5)?,
      laq: row.get(6)?,
    },
    total_questions: row.get(7)?,
    is_completed: row.get::<_, i64>(8)? != 0,
    score: row.get(9)?,
    attempt_id: row.get(10)?,
    created_at: parse_timestamp(row, 11)?,
    completed_at,
  })
}
