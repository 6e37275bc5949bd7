//! Gemini API integration module
//!
//! Provides the HTTP client and data models for the file-upload and
//! content-generation endpoints.

pub mod client;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use client::GeminiClient;
pub use error::GeminiError;
pub use models::{Content, FileMetadata, FileState, Part};
