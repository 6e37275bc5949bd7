use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The three question kinds a quiz can mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
  Mcq,
  Saq,
  Laq,
}

impl QuestionType {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "mcq" => Some(Self::Mcq),
      "saq" => Some(Self::Saq),
      "laq" => Some(Self::Laq),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Mcq => "mcq",
      Self::Saq => "saq",
      Self::Laq => "laq",
    }
  }
}

/// One question of a generated quiz. Immutable once persisted; reattempts
/// reuse the original question set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
  /// Stable per-quiz integer id (1-based, assigned by the generator)
  pub id: i64,
  #[serde(rename = "type")]
  pub question_type: QuestionType,
  pub question: String,
  /// Exactly four options for mcq, absent otherwise
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub options: Option<Vec<String>>,
  #[serde(rename = "correctAnswer")]
  pub correct_answer: String,
  pub explanation: String,
  pub marks: i64,
}

/// Per-type question counts of a quiz.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizCounts {
  pub mcq: u32,
  pub saq: u32,
  pub laq: u32,
}

impl QuizCounts {
  pub fn total(&self) -> u32 {
    self.mcq + self.saq + self.laq
  }
}

/// A generated quiz's mutable "current state" wrapper. The question set
/// itself lives in `quiz_questions` keyed by the same id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuiz {
  pub id: i64,
  pub user_id: i64,
  pub title: String,
  /// Source-document identifier; also the progress grouping key
  pub pdf_source: String,
  pub number_of_questions: QuizCounts,
  pub total_questions: u32,
  pub is_completed: bool,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub score: Option<i64>,
  /// Back-reference to the latest attempt, if any
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub attempt_id: Option<i64>,
  pub created_at: DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub completed_at: Option<DateTime<Utc>>,
}
