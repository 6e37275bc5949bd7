//! Chat sessions grounded in coursebook PDFs.
//!
//! A session is a plain message log; each turn optionally attaches a PDF
//! that the model must answer from, citing pages. The uploaded file lives
//! on the file API only for the duration of the turn.

use serde::Serialize;

use crate::config;
use crate::db;
use crate::domain::{ChatMessage, ChatRole};
use crate::error::ApiError;
use crate::gemini::{Content, Part};
use crate::ingest::{self, PdfSource};
use crate::state::AppState;

/// Outcome of one completed chat turn.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    pub session_id: i64,
    pub user_message: ChatMessage,
    pub assistant_message: ChatMessage,
    /// Set when this turn renamed the session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Derive a session title from its first message.
pub fn derive_title(first_message: &str) -> String {
    let trimmed = first_message.trim();
    if trimmed.chars().count() > config::SESSION_TITLE_MAX {
        let head: String = trimmed.chars().take(config::SESSION_TITLE_TRUNCATED).collect();
        format!("{head}...")
    } else {
        trimmed.to_string()
    }
}

fn grounded_prompt(question: &str) -> String {
    format!(
        "You are a helpful teaching assistant. Answer the student's question \
using only the attached PDF coursebook.\n\n\
Requirements:\n\
1. Base every claim on the PDF content.\n\
2. Cite the supporting passage after each claim in the form \
(Page X: 'quoted text...').\n\
3. If the PDF does not cover the question, say so plainly.\n\n\
Question: {question}"
    )
}

fn tutor_prompt(question: &str) -> String {
    format!(
        "You are a helpful teaching assistant for students working through \
their coursebooks. Answer clearly and concisely.\n\n\
Question: {question}"
    )
}

/// Run one chat turn: persist the student's message, produce the
/// assistant's reply, and persist it.
///
/// The user message is stored before any upstream call so it survives
/// generation failures. When two messages exist afterwards the session is
/// renamed after its opening message.
pub async fn respond(
    state: &AppState,
    session_id: i64,
    message: &str,
    pdf: Option<PdfSource>,
) -> Result<ChatTurn, ApiError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(ApiError::validation("Message is required"));
    }

    let (user_message, history) = {
        let conn = db::try_lock(&state.db)?;
        db::get_session(&conn, session_id)?
            .ok_or_else(|| ApiError::not_found("Chat session not found"))?;
        let history = db::list_messages(&conn, session_id)?;
        let user_message =
            db::insert_message(&conn, session_id, ChatRole::User, message)?;
        (user_message, history)
    };

    let reply = match pdf {
        Some(source) => {
            let document = ingest::ingest(
                &state.gemini,
                &state.temp_dir,
                source,
                config::CHAT_POLL_INTERVAL,
            )
            .await?;
            let contents = vec![Content::user(vec![
                Part::text(grounded_prompt(message)),
                Part::file(document.uri.as_str(), document.mime_type.as_str()),
            ])];
            let result = state
                .gemini
                .generate_content(config::GEMINI_MODEL, contents)
                .await;
            ingest::discard(&state.gemini, &document.remote_name).await;
            result?
        }
        None => {
            let mut contents: Vec<Content> = history
                .iter()
                .map(|m| Content {
                    role: match m.role {
                        ChatRole::User => "user".to_string(),
                        ChatRole::Assistant => "model".to_string(),
                    },
                    parts: vec![Part::text(m.content.clone())],
                })
                .collect();
            contents.push(Content::user(vec![Part::text(tutor_prompt(message))]));
            state
                .gemini
                .generate_content(config::GEMINI_MODEL, contents)
                .await?
        }
    };

    let conn = db::try_lock(&state.db)?;
    let assistant_message =
        db::insert_message(&conn, session_id, ChatRole::Assistant, &reply)?;
    let title = if db::count_messages(&conn, session_id)? == 2 {
        let title = derive_title(&user_message.content);
        db::update_session_title(&conn, session_id, &title)?;
        Some(title)
    } else {
        None
    };
    db::touch_session(&conn, session_id)?;

    Ok(ChatTurn { session_id, user_message, assistant_message, title })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_titles_pass_through_trimmed() {
        assert_eq!(derive_title("  What is entropy?  "), "What is entropy?");
    }

    #[test]
    fn long_titles_are_truncated_with_ellipsis() {
        let long = "a".repeat(70);
        let title = derive_title(&long);
        assert_eq!(title, format!("{}...", "a".repeat(47)));
        assert_eq!(title.len(), 50);
    }

    #[test]
    fn boundary_title_is_kept_whole() {
        let exact = "b".repeat(50);
        assert_eq!(derive_title(&exact), exact);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let long = "é".repeat(70);
        let title = derive_title(&long);
        assert_eq!(title.chars().count(), 50);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn grounded_prompt_demands_page_citations() {
        let prompt = grounded_prompt("What is osmosis?");
        assert!(prompt.contains("(Page X: 'quoted text...')"));
        assert!(prompt.contains("What is osmosis?"));
    }
}
