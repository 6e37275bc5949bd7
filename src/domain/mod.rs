pub mod attempt;
pub mod chat;
pub mod quiz;
pub mod user;

pub use attempt::{AnswerRecord, QuizAttempt};
pub use chat::{ChatMessage, ChatRole, ChatSession};
pub use quiz::{Question, QuestionType, QuizCounts, SavedQuiz};
pub use user::User;
