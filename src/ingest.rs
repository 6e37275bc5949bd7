//! PDF ingestion adapter.
//!
//! Stages a preloaded or uploaded PDF with the Gemini file API and polls
//! until the remote copy is queryable. Temp copies of uploaded bytes are
//! removed on every exit path; the remote staged document is removed
//! best-effort (by `discard` after use, or here on ingestion failure).

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config;
use crate::db::LogOnError;
use crate::error::ApiError;
use crate::gemini::{FileState, GeminiClient};
use crate::paths;

/// Where the document bytes come from.
#[derive(Debug)]
pub enum PdfSource {
    /// A preloaded coursebook under the public directory
    Preloaded { path: PathBuf },
    /// Raw uploaded bytes with the client's declared MIME type
    Upload {
        bytes: Vec<u8>,
        filename: String,
        mime_type: String,
    },
}

/// A staged document the generation API can reference.
#[derive(Debug, Clone)]
pub struct ReadyDocument {
    /// File-API resource name, used for deletion
    pub remote_name: String,
    pub uri: String,
    pub mime_type: String,
}

/// Removes the staged temp file when the ingestion scope ends.
struct TempFileGuard(PathBuf);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if self.0.exists() {
            std::fs::remove_file(&self.0)
                .log_warn(&format!("Failed to clean up temp file {}", self.0.display()));
        }
    }
}

/// Stage a PDF and wait until it is ready for generation requests.
///
/// `poll_interval` differs by flow: 5s for quiz generation, 2s for chat.
/// Polling is bounded at `INGEST_MAX_POLLS` attempts.
pub async fn ingest(
    gemini: &GeminiClient,
    temp_dir: &Path,
    source: PdfSource,
    poll_interval: Duration,
) -> Result<ReadyDocument, ApiError> {
    let (bytes, display_name, _temp_guard) = match source {
        PdfSource::Preloaded { path } => {
            if !path.exists() {
                return Err(ApiError::not_found("Selected PDF file not found"));
            }
            let bytes = std::fs::read(&path)?;
            let display_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("document.pdf")
                .to_string();
            tracing::info!("Using local PDF: {}", path.display());
            (bytes, display_name, None)
        }
        PdfSource::Upload { bytes, filename, mime_type } => {
            if mime_type != config::PDF_MIME_TYPE {
                return Err(ApiError::validation("Please upload a PDF file"));
            }
            if bytes.len() > config::MAX_PDF_BYTES {
                return Err(ApiError::validation("PDF file exceeds the 50 MB limit"));
            }
            if bytes.is_empty() {
                return Err(ApiError::validation("PDF file is required"));
            }

            // The guard removes the staged copy on every exit path
            std::fs::create_dir_all(temp_dir)?;
            let staged = paths::staged_upload_path(temp_dir, &filename);
            std::fs::write(&staged, &bytes)?;
            tracing::info!("Staged uploaded PDF at {}", staged.display());

            (bytes, filename, Some(TempFileGuard(staged)))
        }
    };

    let file = gemini
        .upload_file(bytes, config::PDF_MIME_TYPE, &display_name)
        .await?;
    tracing::info!("Uploaded to file API as {}, awaiting processing", file.name);

    let mut metadata = file;
    let mut polls = 0;
    while metadata.state == FileState::Processing && polls < config::INGEST_MAX_POLLS {
        tracing::debug!(
            "File {} still processing (poll {}/{})",
            metadata.name,
            polls + 1,
            config::INGEST_MAX_POLLS
        );
        tokio::time::sleep(poll_interval).await;
        metadata = match gemini.get_file(&metadata.name).await {
            Ok(m) => m,
            Err(e) => {
                discard(gemini, &metadata.name).await;
                return Err(e.into());
            }
        };
        polls += 1;
    }

    match metadata.state {
        FileState::Failed => {
            discard(gemini, &metadata.name).await;
            Err(ApiError::upstream("PDF processing failed"))
        }
        FileState::Processing => {
            discard(gemini, &metadata.name).await;
            Err(ApiError::upstream("PDF processing timed out"))
        }
        FileState::Active | FileState::StateUnspecified => {
            let Some(uri) = metadata.uri.clone() else {
                discard(gemini, &metadata.name).await;
                return Err(ApiError::upstream(
                    "File API returned no URI for processed document",
                ));
            };
            let mime_type = metadata
                .mime_type
                .clone()
                .unwrap_or_else(|| config::PDF_MIME_TYPE.to_string());
            Ok(ReadyDocument { remote_name: metadata.name, uri, mime_type })
        }
    }
}

/// Best-effort removal of a staged remote document. Failures are logged,
/// never surfaced.
pub async fn discard(gemini: &GeminiClient, remote_name: &str) {
    if gemini
        .delete_file(remote_name)
        .await
        .log_warn(&format!("Failed to delete remote file {remote_name}"))
        .is_some()
    {
        tracing::debug!("Deleted remote file {}", remote_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::GeminiClient;

    fn client() -> GeminiClient {
        GeminiClient::new("test".into())
    }

    #[tokio::test]
    async fn rejects_non_pdf_mime() {
        let tmp = tempfile::tempdir().unwrap();
        let source = PdfSource::Upload {
            bytes: vec![1, 2, 3],
            filename: "notes.txt".into(),
            mime_type: "text/plain".into(),
        };
        let err = ingest(&client(), tmp.path(), source, Duration::from_millis(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn rejects_oversized_upload() {
        let tmp = tempfile::tempdir().unwrap();
        let source = PdfSource::Upload {
            bytes: vec![0; config::MAX_PDF_BYTES + 1],
            filename: "big.pdf".into(),
            mime_type: "application/pdf".into(),
        };
        let err = ingest(&client(), tmp.path(), source, Duration::from_millis(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn missing_preloaded_pdf_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let source = PdfSource::Preloaded { path: tmp.path().join("nope.pdf") };
        let err = ingest(&client(), tmp.path(), source, Duration::from_millis(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn failed_poll_discards_remote_file() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicBool, Ordering};

        use axum::Router;
        use axum::http::StatusCode;
        use axum::routing::{get, post};

        let deleted = Arc::new(AtomicBool::new(false));
        let flag = deleted.clone();

        // Upload succeeds in PROCESSING, the status poll then breaks
        let app = Router::new()
            .route(
                "/upload/v1beta/files",
                post(|| async {
                    axum::Json(serde_json::json!({
                        "file": { "name": "files/t1", "state": "PROCESSING" }
                    }))
                }),
            )
            .route(
                "/v1beta/files/t1",
                get(|| async { StatusCode::INTERNAL_SERVER_ERROR }).delete(move || {
                    let flag = flag.clone();
                    async move {
                        flag.store(true, Ordering::SeqCst);
                        StatusCode::OK
                    }
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let gemini = GeminiClient::with_base_url("test".into(), format!("http://{addr}"));
        let tmp = tempfile::tempdir().unwrap();
        let source = PdfSource::Upload {
            bytes: b"%PDF-1.4".to_vec(),
            filename: "doc.pdf".into(),
            mime_type: "application/pdf".into(),
        };

        let err = ingest(&gemini, tmp.path(), source, Duration::from_millis(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Upstream { .. }));
        assert!(deleted.load(Ordering::SeqCst));
    }

    #[test]
    fn temp_guard_removes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("staged.pdf");
        std::fs::write(&path, b"x").unwrap();
        {
            let _guard = TempFileGuard(path.clone());
        }
        assert!(!path.exists());
    }
}
