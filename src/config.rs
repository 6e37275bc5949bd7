//! Application configuration constants.
//!
//! This module centralizes all configurable values so nothing is
//! hardcoded in handlers or the ingestion pipeline.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

// ==================== Database Configuration ====================

/// Configuration file structure for config.toml
#[derive(Debug, Deserialize)]
struct AppConfig {
    database: Option<DatabaseConfig>,
}

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
    path: Option<String>,
}

/// Load database path with priority: config.toml > .env > default
pub fn load_database_path() -> PathBuf {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Priority 1: config.toml
    if let Ok(contents) = std::fs::read_to_string("config.toml") {
        if let Ok(config) = toml::from_str::<AppConfig>(&contents) {
            if let Some(db) = config.database {
                if let Some(path) = db.path {
                    tracing::info!("Using database from config.toml: {}", path);
                    return PathBuf::from(path);
                }
            }
        }
    }

    // Priority 2: .env DATABASE_PATH
    if let Ok(path) = std::env::var("DATABASE_PATH") {
        tracing::info!("Using database from DATABASE_PATH env: {}", path);
        return PathBuf::from(path);
    }

    // Default
    let default = PathBuf::from(crate::paths::db_path());
    tracing::info!("Using default database path: {}", default.display());
    default
}

// ==================== Server Configuration ====================

/// Server address to bind to
pub const SERVER_ADDR: &str = "0.0.0.0";

/// Server port
pub const SERVER_PORT: u16 = 3000;

/// Get the full server bind address
pub fn server_bind_addr() -> String {
    format!("{}:{}", SERVER_ADDR, SERVER_PORT)
}

// ==================== Gemini Configuration ====================

/// Read the Gemini API key from the environment (.env supported)
pub fn gemini_api_key() -> Option<String> {
    let _ = dotenvy::dotenv();
    std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty())
}

/// Model used for quiz generation and chat
pub const GEMINI_MODEL: &str = "gemini-2.0-flash-exp";

// ==================== Ingestion Configuration ====================

/// Maximum accepted upload size (50 MB)
pub const MAX_PDF_BYTES: usize = 50 * 1024 * 1024;

/// Only MIME type the ingestion adapter accepts
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Maximum status polls before an ingestion times out
pub const INGEST_MAX_POLLS: u32 = 20;

/// Poll interval while generating a quiz (longer documents, slower loop)
pub const QUIZ_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Poll interval during a chat turn (user is waiting on the reply)
pub const CHAT_POLL_INTERVAL: Duration = Duration::from_secs(2);

// ==================== Quiz Configuration ====================

/// Questions allowed per requested type
pub const MIN_QUESTIONS_PER_TYPE: u32 = 1;
pub const MAX_QUESTIONS_PER_TYPE: u32 = 20;

/// Fraction of canonical-answer words that must appear in a free-text
/// answer for it to count as correct
pub const FREE_TEXT_OVERLAP_THRESHOLD: f64 = 0.5;

// ==================== Progress Configuration ====================

/// Number of attempts returned in the progress preview list
pub const RECENT_ATTEMPTS_LIMIT: usize = 10;

// ==================== Chat Configuration ====================

/// Session titles longer than this get truncated
pub const SESSION_TITLE_MAX: usize = 50;

/// Characters kept when truncating (an ellipsis is appended)
pub const SESSION_TITLE_TRUNCATED: usize = 47;

// ==================== Auth Configuration ====================

/// Token lifetime in days
pub const TOKEN_EXPIRY_DAYS: i64 = 7;

/// Read the JWT signing secret (falls back to a dev-only default)
pub fn jwt_secret() -> String {
    let _ = dotenvy::dotenv();
    std::env::var("JWT_SECRET").unwrap_or_else(|_| {
        tracing::warn!("JWT_SECRET not set, using insecure development default");
        "quizmind-dev-secret-change-me".to_string()
    })
}
