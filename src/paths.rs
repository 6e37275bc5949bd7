//! Project path functions - single source of truth for all file paths.
//!
//! ## Environment Variables
//!
//! - `DATA_DIR`: Override the base data directory (default: "data")

use std::env;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Lazily initialized data directory from DATA_DIR env var
static DATA_DIR_VALUE: OnceLock<String> = OnceLock::new();

/// Get the base data directory (from DATA_DIR env var or default "data")
pub fn data_dir() -> &'static str {
    DATA_DIR_VALUE.get_or_init(|| env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()))
}

/// SQLite database path
pub fn db_path() -> String {
    format!("{}/quizmind.db", data_dir())
}

/// Staging directory for uploaded PDFs awaiting ingestion
pub fn temp_dir() -> String {
    format!("{}/tmp", data_dir())
}

/// Directory of preloaded coursebook PDFs served at /public
pub const PUBLIC_DIR: &str = "public";

/// Build a timestamp-prefixed staging path for an uploaded file.
///
/// The prefix keeps concurrent uploads of the same filename from
/// colliding; the random suffix covers same-millisecond uploads.
pub fn staged_upload_path(temp_dir: &Path, original_name: &str) -> PathBuf {
    let sanitized: String = original_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let nonce: u32 = rand::random();
    temp_dir.join(format!(
        "{}-{:08x}-{}",
        chrono::Utc::now().timestamp_millis(),
        nonce,
        sanitized
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_path_sanitizes_filename() {
        let dir = Path::new("/tmp/stage");
        let path = staged_upload_path(dir, "my file/../notes.pdf");
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with("my_file_.._notes.pdf"));
        assert!(!name.contains('/'));
        assert_eq!(path.parent().unwrap(), dir);
    }

    #[test]
    fn staged_paths_are_unique() {
        let dir = Path::new("/tmp/stage");
        let a = staged_upload_path(dir, "book.pdf");
        let b = staged_upload_path(dir, "book.pdf");
        assert_ne!(a, b);
    }
}
