use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::quiz::QuestionType;

/// One graded answer inside an attempt, with the question snapshot
/// denormalized for attempt-detail display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
  pub question_id: i64,
  pub question: String,
  pub question_type: QuestionType,
  pub user_answer: String,
  pub correct_answer: String,
  pub is_correct: bool,
  pub marks: i64,
  pub earned_marks: i64,
  pub explanation: String,
}

/// An immutable record of one completed pass over a quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
  pub id: i64,
  pub user_id: i64,
  pub saved_quiz_id: i64,
  pub quiz_title: String,
  pub pdf_source: String,
  pub total_questions: u32,
  pub total_marks: i64,
  pub earned_marks: i64,
  pub percentage: f64,
  pub correct_answers: u32,
  pub incorrect_answers: u32,
  pub answers: Vec<AnswerRecord>,
  /// 1-based, scoped to (user, quiz), strictly increasing
  pub attempt_number: u32,
  pub completed_at: DateTime<Utc>,
  /// Seconds spent, when the client reported it
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub time_taken: Option<i64>,
}
