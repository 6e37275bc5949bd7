//! Progress aggregation across a user's quiz attempts.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::config;
use crate::db;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStats {
  pub total_quizzes: u32,
  pub completed_quizzes: u32,
  pub total_attempts: u32,
  pub total_questions_attempted: u32,
  pub total_correct: u32,
  pub total_incorrect: u32,
  /// Unweighted mean of per-attempt percentages.
  pub average_score: f64,
  /// Question-weighted: totalCorrect / totalQuestionsAttempted.
  pub accuracy_rate: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicProgress {
  pub topic: String,
  pub attempts: u32,
  pub total_questions: u32,
  pub correct_answers: u32,
  pub average_score: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentAttempt {
  pub id: i64,
  pub quiz_title: String,
  pub pdf_source: String,
  pub score: i64,
  pub total_marks: i64,
  pub percentage: f64,
  pub correct_answers: u32,
  pub total_questions: u32,
  pub attempt_number: u32,
  pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
  pub stats: ProgressStats,
  pub topics: Vec<TopicProgress>,
  pub recent_attempts: Vec<RecentAttempt>,
}

/// Build the full progress report for a user.
///
/// The overall averageScore treats every attempt equally regardless of quiz
/// size; accuracyRate and the per-topic averages weight by question count.
/// Every ratio degrades to 0.0 when its denominator is zero.
pub fn aggregate(conn: &Connection, user_id: i64) -> Result<ProgressReport, ApiError> {
  let (total_quizzes, completed_quizzes) = db::count_quizzes(conn, user_id)?;
  let (total_quizzes, completed_quizzes) = (total_quizzes as u32, completed_quizzes as u32);
  let attempts = db::list_attempts(conn, user_id)?;

  let total_attempts = attempts.len() as u32;
  let total_questions_attempted: u32 = attempts.iter().map(|a| a.total_questions).sum();
  let total_correct: u32 = attempts.iter().map(|a| a.correct_answers).sum();
  let total_incorrect: u32 = attempts.iter().map(|a| a.incorrect_answers).sum();

  let average_score = if attempts.is_empty() {
    0.0
  } else {
    attempts.iter().map(|a| a.percentage).sum::<f64>() / attempts.len() as f64
  };
  let accuracy_rate = ratio_percent(total_correct, total_questions_attempted);

  let mut buckets: BTreeMap<String, (u32, u32, u32)> = BTreeMap::new();
  for attempt in &attempts {
    let entry = buckets.entry(attempt.pdf_source.clone()).or_default();
    entry.0 += 1;
    entry.1 += attempt.total_questions;
    entry.2 += attempt.correct_answers;
  }
  let topics = buckets
    .into_iter()
    .map(|(topic, (count, questions, correct))| TopicProgress {
      topic,
      attempts: count,
      total_questions: questions,
      correct_answers: correct,
      average_score: ratio_percent(correct, questions),
    })
    .collect();

  // list_attempts is already newest-first
  let recent_attempts = attempts
    .iter()
    .take(config::RECENT_ATTEMPTS_LIMIT)
    .map(|a| RecentAttempt {
      id: a.id,
      quiz_title: a.quiz_title.clone(),
      pdf_source: a.pdf_source.clone(),
      score: a.earned_marks,
      total_marks: a.total_marks,
      percentage: a.percentage,
      correct_answers: a.correct_answers,
      total_questions: a.total_questions,
      attempt_number: a.attempt_number,
      completed_at: a.completed_at,
    })
    .collect();

  Ok(ProgressReport {
    stats: ProgressStats {
      total_quizzes,
      completed_quizzes,
      total_attempts,
      total_questions_attempted,
      total_correct,
      total_incorrect,
      average_score,
      accuracy_rate,
    },
    topics,
    recent_attempts,
  })
}

fn ratio_percent(numerator: u32, denominator: u32) -> f64 {
  if denominator == 0 {
    0.0
  } else {
    numerator as f64 / denominator as f64 * 100.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::QuizAttempt;
  use crate::testing::{sample_attempt, TestEnv};

  fn record(env: &mut TestEnv, attempt: &QuizAttempt) {
    db::record_attempt(&mut env.conn, attempt).unwrap();
  }

  #[test]
  fn empty_history_reports_zeroes() {
    let mut env = TestEnv::new().unwrap();
    let user_id = env.seed_user("Alice");
    let report = aggregate(&env.conn, user_id).unwrap();
    assert_eq!(report.stats.total_attempts, 0);
    assert_eq!(report.stats.average_score, 0.0);
    assert_eq!(report.stats.accuracy_rate, 0.0);
    assert!(report.topics.is_empty());
    assert!(report.recent_attempts.is_empty());
  }

  #[test]
  fn average_score_is_unweighted_accuracy_is_weighted() {
    let mut env = TestEnv::new().unwrap();
    let user_id = env.seed_user("Alice");
    let quiz_a = env.seed_quiz(user_id, "Big quiz", "physics");
    let quiz_b = env.seed_quiz(user_id, "Small quiz", "physics");

    // 8/10 questions right (80%), then 3/5 (60%)
    let mut a = sample_attempt(user_id, quiz_a, 1);
    a.pdf_source = "physics".into();
    a.total_questions = 10;
    a.correct_answers = 8;
    a.incorrect_answers = 2;
    a.total_marks = 10;
    a.earned_marks = 8;
    a.percentage = 80.0;
    record(&mut env, &a);

    let mut b = sample_attempt(user_id, quiz_b, 1);
    b.pdf_source = "physics".into();
    b.total_questions = 5;
    b.correct_answers = 3;
    b.incorrect_answers = 2;
    b.total_marks = 5;
    b.earned_marks = 3;
    b.percentage = 60.0;
    record(&mut env, &b);

    let report = aggregate(&env.conn, user_id).unwrap();
    assert_eq!(report.stats.average_score, 70.0);
    assert!((report.stats.accuracy_rate - 11.0 / 15.0 * 100.0).abs() < 1e-9);
    assert_eq!(report.stats.total_questions_attempted, 15);
    assert_eq!(report.stats.total_correct, 11);

    // The topic bucket weights by questions, not attempts
    let topic = report.topics.iter().find(|t| t.topic == "physics").unwrap();
    assert!((topic.average_score - 11.0 / 15.0 * 100.0).abs() < 1e-9);
  }

  #[test]
  fn topics_bucket_by_pdf_source() {
    let mut env = TestEnv::new().unwrap();
    let user_id = env.seed_user("Alice");
    let quiz_a = env.seed_quiz(user_id, "Physics quiz", "physics");
    let quiz_b = env.seed_quiz(user_id, "History quiz", "history");

    let mut a = sample_attempt(user_id, quiz_a, 1);
    a.pdf_source = "physics".into();
    record(&mut env, &a);
    let mut b = sample_attempt(user_id, quiz_b, 1);
    b.pdf_source = "history".into();
    record(&mut env, &b);
    let mut c = sample_attempt(user_id, quiz_a, 2);
    c.pdf_source = "physics".into();
    record(&mut env, &c);

    let report = aggregate(&env.conn, user_id).unwrap();
    assert_eq!(report.topics.len(), 2);
    let physics = report.topics.iter().find(|t| t.topic == "physics").unwrap();
    assert_eq!(physics.attempts, 2);
  }

  #[test]
  fn recent_attempts_are_capped() {
    let mut env = TestEnv::new().unwrap();
    let user_id = env.seed_user("Alice");
    let quiz_id = env.seed_quiz(user_id, "Quiz", "src");
    for n in 1..=12 {
      let attempt = sample_attempt(user_id, quiz_id, n);
      record(&mut env, &attempt);
    }

    let report = aggregate(&env.conn, user_id).unwrap();
    assert_eq!(report.stats.total_attempts, 12);
    assert_eq!(report.recent_attempts.len(), config::RECENT_ATTEMPTS_LIMIT);
  }
}
