//! Data models for Gemini API requests and responses

use serde::{Deserialize, Serialize};

/// Processing state of an uploaded file
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    #[default]
    StateUnspecified,
    Processing,
    Active,
    Failed,
}

/// Metadata the file API returns for a staged document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    /// Resource name, e.g. "files/abc123"
    pub name: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub state: FileState,
}

/// Envelope of the upload endpoint
#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    pub file: FileMetadata,
}

/// One part of a content turn: either text or a file reference
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_data: Option<FileData>,
}

impl Part {
    pub fn text(content: impl Into<String>) -> Self {
        Self { text: Some(content.into()), file_data: None }
    }

    pub fn file(uri: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            text: None,
            file_data: Some(FileData { file_uri: uri.into(), mime_type: mime_type.into() }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub file_uri: String,
    pub mime_type: String,
}

/// A single content turn in a generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self { role: "user".to_string(), parts }
    }
}

/// Request body for the generateContent endpoint
#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

/// Response body of the generateContent endpoint
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Content,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if any
    pub fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_state_parses_wire_format() {
        let meta: FileMetadata = serde_json::from_str(
            r#"{"name":"files/abc","uri":"https://files/abc","mimeType":"application/pdf","state":"PROCESSING"}"#,
        )
        .unwrap();
        assert_eq!(meta.state, FileState::Processing);
        assert_eq!(meta.mime_type.as_deref(), Some("application/pdf"));
    }

    #[test]
    fn response_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello "},{"text":"world"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("Hello world"));
    }

    #[test]
    fn empty_candidates_yield_no_text() {
        let response: GenerateContentResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn request_serializes_file_part() {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![
                Part::text("prompt"),
                Part::file("https://files/abc", "application/pdf"),
            ])],
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""fileData""#));
        assert!(json.contains(r#""fileUri""#));
        assert!(!json.contains("null"));
    }
}
