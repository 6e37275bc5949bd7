pub mod auth;
pub mod chat;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod gemini;
pub mod grading;
pub mod handlers;
pub mod ingest;
pub mod paths;
pub mod progress;
pub mod quizgen;
pub mod state;

#[cfg(test)]
pub mod testing;
