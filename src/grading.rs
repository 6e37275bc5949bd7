//! Answer grading and attempt recording.
//!
//! Correctness is recomputed here from the stored canonical answers; the
//! client's own grading is display-only and never persisted.

use std::collections::HashSet;

use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;

use crate::config;
use crate::db;
use crate::domain::{AnswerRecord, Question, QuestionType, QuizAttempt};
use crate::error::ApiError;

/// One submitted answer, keyed to a question by its per-quiz id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
  pub question_id: i64,
  #[serde(default)]
  pub user_answer: String,
}

/// The persisted outcome of a submission.
#[derive(Debug)]
pub struct AttemptSummary {
  pub attempt_id: i64,
  pub score: i64,
  pub total_marks: i64,
  pub percentage: f64,
  pub correct_answers: u32,
  pub incorrect_answers: u32,
}

/// Deterministic, pure correctness check.
///
/// mcq: exact case-insensitive match after trimming. saq/laq: at least 50%
/// of the canonical answer's words must appear in the submitted answer
/// (order- and duplicate-insensitive). A lenient heuristic, not a semantic
/// check.
pub fn check_answer(user_answer: &str, correct_answer: &str, question_type: QuestionType) -> bool {
  match question_type {
    QuestionType::Mcq => {
      user_answer.trim().eq_ignore_ascii_case(correct_answer.trim())
    }
    QuestionType::Saq | QuestionType::Laq => {
      let user_words: HashSet<String> = word_set(user_answer);
      let correct_words: HashSet<String> = word_set(correct_answer);
      if correct_words.is_empty() {
        return false;
      }
      let matched = correct_words.iter().filter(|w| user_words.contains(*w)).count();
      matched as f64 >= correct_words.len() as f64 * config::FREE_TEXT_OVERLAP_THRESHOLD
    }
  }
}

fn word_set(text: &str) -> HashSet<String> {
  text
    .split_whitespace()
    .map(|w| w.to_lowercase())
    .collect()
}

/// Grade one submitted answer against its question, denormalizing the
/// question snapshot into the record.
pub fn grade_answer(question: &Question, user_answer: &str) -> AnswerRecord {
  let is_correct = check_answer(user_answer, &question.correct_answer, question.question_type);
  AnswerRecord {
    question_id: question.id,
    question: question.question.clone(),
    question_type: question.question_type,
    user_answer: user_answer.to_string(),
    correct_answer: question.correct_answer.clone(),
    is_correct,
    marks: question.marks,
    earned_marks: if is_correct { question.marks } else { 0 },
    explanation: question.explanation.clone(),
  }
}

/// Grade a full submission and persist the attempt.
///
/// Looks up the quiz and its questions (404 when either is missing),
/// recomputes every answer's correctness, and records the attempt together
/// with the quiz's completion update in one transaction.
pub fn submit(
  conn: &mut Connection,
  quiz_id: i64,
  user_id: i64,
  answers: &[SubmittedAnswer],
  time_taken: Option<i64>,
) -> Result<AttemptSummary, ApiError> {
  let quiz = db::get_saved_quiz(conn, quiz_id)?
    .ok_or_else(|| ApiError::not_found("Quiz not found"))?;
  let questions = db::get_quiz_questions(conn, quiz_id)?;
  if questions.is_empty() {
    return Err(ApiError::not_found("Quiz data not found"));
  }

  let attempt_number = db::next_attempt_number(conn, user_id, quiz_id)?;

  let mut seen = HashSet::with_capacity(answers.len());
  for submitted in answers {
    if !seen.insert(submitted.question_id) {
      return Err(ApiError::validation(format!(
        "Duplicate answer for question id {}",
        submitted.question_id
      )));
    }
  }

  let mut records = Vec::with_capacity(answers.len());
  for submitted in answers {
    let question = questions
      .iter()
      .find(|q| q.id == submitted.question_id)
      .ok_or_else(|| {
        ApiError::validation(format!("Unknown question id {}", submitted.question_id))
      })?;
    records.push(grade_answer(question, &submitted.user_answer));
  }

  // Unanswered questions still count against the score
  let total_marks: i64 = questions.iter().map(|q| q.marks).sum();
  let earned_marks: i64 = records.iter().map(|r| r.earned_marks).sum();
  let correct_answers = records.iter().filter(|r| r.is_correct).count() as u32;
  let incorrect_answers = quiz.total_questions.saturating_sub(correct_answers);
  let percentage = if total_marks > 0 {
    earned_marks as f64 / total_marks as f64 * 100.0
  } else {
    0.0
  };

  let attempt = QuizAttempt {
    id: 0,
    user_id,
    saved_quiz_id: quiz_id,
    quiz_title: quiz.title.clone(),
    pdf_source: quiz.pdf_source.clone(),
    total_questions: quiz.total_questions,
    total_marks,
    earned_marks,
    percentage,
    correct_answers,
    incorrect_answers,
    answers: records,
    attempt_number,
    completed_at: Utc::now(),
    time_taken,
  };

  let attempt_id = db::record_attempt(conn, &attempt)?;

  Ok(AttemptSummary {
    attempt_id,
    score: earned_marks,
    total_marks,
    percentage,
    correct_answers,
    incorrect_answers,
  })
}
