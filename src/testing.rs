//! Test utilities for database setup.
//!
//! Provides helpers that reuse authoritative schema initialization,
//! eliminating schema duplication in test code.

use chrono::Utc;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use crate::domain::{AnswerRecord, Question, QuestionType, QuizAttempt, QuizCounts};
use crate::gemini::GeminiClient;
use crate::state::AppState;

/// Test environment with a file-backed database using the authoritative
/// schema. The temp directory is kept alive so the file persists for the
/// test's duration and is cleaned up on drop.
pub struct TestEnv {
    pub temp: TempDir,
    pub conn: Connection,
}

impl TestEnv {
    pub fn new() -> rusqlite::Result<Self> {
        let temp =
            TempDir::new().map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let db_path = temp.path().join("quizmind.db");
        let conn = Connection::open(&db_path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        crate::db::schema::run_migrations(&conn)?;

        Ok(Self { temp, conn })
    }

    /// Get the temporary directory path for creating test files.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn seed_user(&mut self, name: &str) -> i64 {
        crate::db::users::insert_user(&self.conn, name, None, None)
            .expect("seed user")
    }

    /// Insert a quiz with the standard two-question sample set.
    pub fn seed_quiz(&mut self, user_id: i64, title: &str, pdf_source: &str) -> i64 {
        crate::db::quizzes::insert_quiz_with_questions(
            &mut self.conn,
            user_id,
            title,
            pdf_source,
            QuizCounts { mcq: 1, saq: 1, laq: 0 },
            &sample_questions(),
        )
        .expect("seed quiz")
    }
}

/// Application state over a fresh in-memory database, for route-level
/// tests that never reach the network.
pub fn http_state() -> AppState {
    let db = crate::db::init_db(Path::new(":memory:")).expect("init test db");
    AppState::new(
        db,
        Arc::new(GeminiClient::new("test-key".to_string())),
        std::env::temp_dir(),
        PathBuf::from("public"),
    )
}

/// One mcq and one saq, enough to exercise both grading rules.
pub fn sample_questions() -> Vec<Question> {
    vec![
        Question {
            id: 1,
            question_type: QuestionType::Mcq,
            question: "What is the capital of France?".to_string(),
            options: Some(vec![
                "Paris".to_string(),
                "London".to_string(),
                "Berlin".to_string(),
                "Madrid".to_string(),
            ]),
            correct_answer: "Paris".to_string(),
            explanation: "Paris has been the capital since 987.".to_string(),
            marks: 1,
        },
        Question {
            id: 2,
            question_type: QuestionType::Saq,
            question: "What does the mitochondria do?".to_string(),
            options: None,
            correct_answer: "The mitochondria produces energy for the cell".to_string(),
            explanation: "It is the powerhouse of the cell.".to_string(),
            marks: 2,
        },
    ]
}

/// A fully-graded attempt over the sample question set.
pub fn sample_attempt(user_id: i64, quiz_id: i64, attempt_number: u32) -> QuizAttempt {
    QuizAttempt {
        id: 0,
        user_id,
        saved_quiz_id: quiz_id,
        quiz_title: "Chapter 1".to_string(),
        pdf_source: "ch1".to_string(),
        total_questions: 2,
        total_marks: 3,
        earned_marks: 1,
        percentage: 100.0 / 3.0,
        correct_answers: 1,
        incorrect_answers: 1,
        answers: vec![
            AnswerRecord {
                question_id: 1,
                question: "What is the capital of France?".to_string(),
                question_type: QuestionType::Mcq,
                user_answer: "paris".to_string(),
                correct_answer: "Paris".to_string(),
                is_correct: true,
                marks: 1,
                earned_marks: 1,
                explanation: "Paris has been the capital since 987.".to_string(),
            },
            AnswerRecord {
                question_id: 2,
                question: "What does the mitochondria do?".to_string(),
                question_type: QuestionType::Saq,
                user_answer: "no idea".to_string(),
                correct_answer: "The mitochondria produces energy for the cell".to_string(),
                is_correct: false,
                marks: 2,
                earned_marks: 0,
                explanation: "It is the powerhouse of the cell.".to_string(),
            },
        ],
        attempt_number,
        completed_at: Utc::now(),
        time_taken: Some(90),
    }
}
