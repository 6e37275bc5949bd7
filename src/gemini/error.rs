//! Error types for Gemini API integration

use thiserror::Error;

/// Errors that can occur when talking to the Gemini API
#[derive(Debug, Error)]
pub enum GeminiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error ({status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },

    /// Rate limited by the API
    #[error("Rate limited. Retry after {retry_after_seconds} seconds")]
    RateLimited {
        /// Seconds to wait before retrying
        retry_after_seconds: u64,
    },

    /// The model returned no usable text
    #[error("Empty response from model")]
    EmptyResponse,

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl GeminiError {
    /// Check if this error is worth one retry (transient transport/limit)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GeminiError::RateLimited { .. }
                | GeminiError::RequestError(_)
                | GeminiError::ApiError { status: 500..=599, .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverability() {
        assert!(GeminiError::RateLimited { retry_after_seconds: 5 }.is_recoverable());
        assert!(
            GeminiError::ApiError { status: 503, message: "overloaded".into() }.is_recoverable()
        );
        assert!(
            !GeminiError::ApiError { status: 400, message: "bad".into() }.is_recoverable()
        );
        assert!(!GeminiError::EmptyResponse.is_recoverable());
    }
}
