//! HTTP client for the Gemini file and generation APIs

use reqwest::Client;

use super::error::GeminiError;
use super::models::{
    Content, FileMetadata, GenerateContentRequest, GenerateContentResponse, UploadResponse,
};

/// Gemini API client
pub struct GeminiClient {
    /// HTTP client
    client: Client,
    /// API key, sent as the `x-goog-api-key` header so it never appears
    /// in request URLs (which surface in transport error messages)
    api_key: String,
    /// API base URL
    base_url: String,
}

impl GeminiClient {
    /// Default API base URL
    const BASE_URL: &'static str = "https://generativelanguage.googleapis.com";

    /// Create a new Gemini client with the given API key
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, Self::BASE_URL.to_string())
    }

    /// Create a client against an alternative endpoint
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, api_key, base_url }
    }

    /// Stage a document with the file API. The returned metadata usually
    /// starts in the `PROCESSING` state; poll `get_file` until it settles.
    pub async fn upload_file(
        &self,
        bytes: Vec<u8>,
        mime_type: &str,
        display_name: &str,
    ) -> Result<FileMetadata, GeminiError> {
        let url = format!("{}/upload/v1beta/files?uploadType=multipart", self.base_url);

        let metadata = serde_json::json!({
            "file": { "displayName": display_name }
        });
        let form = reqwest::multipart::Form::new()
            .part(
                "metadata",
                reqwest::multipart::Part::text(metadata.to_string())
                    .mime_str("application/json")?,
            )
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes)
                    .file_name(display_name.to_string())
                    .mime_str(mime_type)?,
            );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await?;
        let body = Self::check_status(response).await?;
        let upload: UploadResponse = serde_json::from_str(&body)?;
        Ok(upload.file)
    }

    /// Fetch current metadata (including processing state) for a staged file
    pub async fn get_file(&self, name: &str) -> Result<FileMetadata, GeminiError> {
        let url = format!("{}/v1beta/{}", self.base_url, name);
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        let body = Self::check_status(response).await?;
        let metadata: FileMetadata = serde_json::from_str(&body)?;
        Ok(metadata)
    }

    /// Remove a staged file. Callers treat failures as best-effort.
    pub async fn delete_file(&self, name: &str) -> Result<(), GeminiError> {
        let url = format!("{}/v1beta/{}", self.base_url, name);
        let response = self
            .client
            .delete(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    /// Send a generation request and return the first candidate's text
    pub async fn generate_content(
        &self,
        model: &str,
        contents: Vec<Content>,
    ) -> Result<String, GeminiError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        let request = GenerateContentRequest { contents };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;
        let body = Self::check_status(response).await?;
        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
        parsed.text().ok_or(GeminiError::EmptyResponse)
    }

    /// Map HTTP failures to typed errors, passing successful bodies through
    async fn check_status(response: reqwest::Response) -> Result<String, GeminiError> {
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(GeminiError::RateLimited { retry_after_seconds: retry_after });
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeminiError::ApiError { status: status.as_u16(), message });
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = GeminiClient::new("test-key".to_string());
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url, GeminiClient::BASE_URL);
    }

    #[tokio::test]
    async fn transport_errors_do_not_leak_the_key() {
        // Port 1 refuses the connection, producing a reqwest transport
        // error whose message includes the request URL
        let client =
            GeminiClient::with_base_url("sk-secret-123".to_string(), "http://127.0.0.1:1".into());
        let err = client.get_file("files/missing").await.unwrap_err();
        assert!(!err.to_string().contains("sk-secret-123"));
    }
}
