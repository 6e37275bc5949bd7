//! Application state shared by all handlers.

use std::path::PathBuf;
use std::sync::Arc;

use crate::db::DbPool;
use crate::gemini::GeminiClient;

#[derive(Clone)]
pub struct AppState {
    /// Shared database connection
    pub db: DbPool,

    /// Upstream AI client
    pub gemini: Arc<GeminiClient>,

    /// Staging directory for uploaded PDFs
    pub temp_dir: PathBuf,

    /// Directory of preloaded coursebook PDFs
    pub public_dir: PathBuf,
}

impl AppState {
    pub fn new(db: DbPool, gemini: Arc<GeminiClient>, temp_dir: PathBuf, public_dir: PathBuf) -> Self {
        Self { db, gemini, temp_dir, public_dir }
    }

    /// Resolve a preloaded PDF identifier (e.g. "/pdfs/ncert/physics-part-1-ch1.pdf")
    /// to its on-disk path, rejecting traversal outside the public directory.
    pub fn preloaded_pdf_path(&self, identifier: &str) -> Option<PathBuf> {
        let relative = identifier.trim_start_matches('/');
        if relative.split('/').any(|seg| seg == "..") {
            return None;
        }
        Some(self.public_dir.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::new(
            crate::db::init_db(std::path::Path::new(":memory:")).unwrap(),
            Arc::new(GeminiClient::new("test".into())),
            PathBuf::from("/tmp/stage"),
            PathBuf::from("public"),
        )
    }

    #[test]
    fn preloaded_path_resolves_under_public() {
        let state = state();
        let path = state.preloaded_pdf_path("/pdfs/ncert/physics-part-1-ch1.pdf").unwrap();
        assert_eq!(path, PathBuf::from("public/pdfs/ncert/physics-part-1-ch1.pdf"));
    }

    #[test]
    fn preloaded_path_rejects_traversal() {
        let state = state();
        assert!(state.preloaded_pdf_path("/pdfs/../../etc/passwd").is_none());
    }
}
