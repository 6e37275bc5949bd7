//! Request error taxonomy.
//!
//! Every handler returns `Result<_, ApiError>`; the `IntoResponse` impl
//! converts failures into the uniform `{"success": false, ...}` JSON body
//! at the outermost boundary.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::gemini::GeminiError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request fields (400)
    #[error("{0}")]
    Validation(String),

    /// Bad credentials or token (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Referenced user/quiz/session/attempt absent (404)
    #[error("{0}")]
    NotFound(String),

    /// External AI or ingestion failure, including parse failures (500).
    /// `details` carries a diagnostic fragment, never secrets.
    #[error("{message}")]
    Upstream {
        message: String,
        details: Option<String>,
    },

    /// Unexpected persistence or IO failure (500)
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream {
            message: msg.into(),
            details: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {}", self);
        }

        let mut body = json!({
            "success": false,
            "error": self.to_string(),
        });
        if let ApiError::Upstream {
            details: Some(details),
            ..
        } = &self
        {
            body["details"] = json!(details);
        }

        (status, Json(body)).into_response()
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Internal(format!("Database error: {}", e))
    }
}

impl From<crate::db::DbLockError> for ApiError {
    fn from(e: crate::db::DbLockError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<GeminiError> for ApiError {
    fn from(e: GeminiError) -> Self {
        Self::Upstream {
            message: e.to_string(),
            details: None,
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        Self::Internal(format!("IO error: {}", e))
    }
}
