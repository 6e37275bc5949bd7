//! Quiz generator.
//!
//! Renders a natural-language instruction from the quiz configuration,
//! invokes the generative API against an ingested document, and parses the
//! returned text into a structured quiz.

use serde::Deserialize;

use crate::config;
use crate::domain::{Question, QuizCounts};
use crate::error::ApiError;
use crate::gemini::{Content, GeminiClient, Part};
use crate::ingest::ReadyDocument;

/// Which question types the user asked for.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct QuizTypes {
    #[serde(default)]
    pub mcq: bool,
    #[serde(default)]
    pub saq: bool,
    #[serde(default)]
    pub laq: bool,
}

/// Raw quiz configuration from the request.
#[derive(Debug, Clone, Copy)]
pub struct QuizConfig {
    pub types: QuizTypes,
    pub counts: QuizCounts,
}

impl QuizConfig {
    /// Validate and reduce to effective per-type counts: unrequested types
    /// drop to zero, requested types must be within 1-20.
    pub fn effective_counts(&self) -> Result<QuizCounts, ApiError> {
        if !self.types.mcq && !self.types.saq && !self.types.laq {
            return Err(ApiError::validation("At least one quiz type must be selected"));
        }

        let pick = |requested: bool, count: u32, label: &str| -> Result<u32, ApiError> {
            if !requested {
                return Ok(0);
            }
            if !(config::MIN_QUESTIONS_PER_TYPE..=config::MAX_QUESTIONS_PER_TYPE).contains(&count)
            {
                return Err(ApiError::validation(format!(
                    "Number of {} questions must be between {} and {}",
                    label,
                    config::MIN_QUESTIONS_PER_TYPE,
                    config::MAX_QUESTIONS_PER_TYPE
                )));
            }
            Ok(count)
        };

        Ok(QuizCounts {
            mcq: pick(self.types.mcq, self.counts.mcq, "MCQ")?,
            saq: pick(self.types.saq, self.counts.saq, "SAQ")?,
            laq: pick(self.types.laq, self.counts.laq, "LAQ")?,
        })
    }
}

/// Parsed model output before persistence.
#[derive(Debug, Deserialize)]
pub struct GeneratedQuiz {
    #[serde(default)]
    pub title: Option<String>,
    pub questions: Vec<Question>,
}

/// Render the generation instruction for the requested counts.
pub fn build_prompt(counts: QuizCounts) -> String {
    let mut requirements = Vec::new();
    if counts.mcq > 0 {
        requirements.push(format!(
            "- {} Multiple Choice Questions (MCQs) with 4 options each",
            counts.mcq
        ));
    }
    if counts.saq > 0 {
        requirements.push(format!(
            "- {} Short Answer Questions (SAQs) requiring 2-3 sentence answers",
            counts.saq
        ));
    }
    if counts.laq > 0 {
        requirements.push(format!(
            "- {} Long Answer Questions (LAQs) requiring detailed paragraph answers",
            counts.laq
        ));
    }

    format!(
        r#"You are an expert educator. Generate a comprehensive quiz from the provided PDF document.

## QUIZ REQUIREMENTS:

{requirements}

## OUTPUT FORMAT:

Return ONLY a valid JSON object with this exact structure (no markdown, no code blocks, just pure JSON):

{{
  "quiz": {{
    "title": "Quiz title based on PDF content",
    "totalQuestions": {total},
    "questions": [
      {{
        "id": 1,
        "type": "mcq",
        "question": "Question text here?",
        "options": ["Option A", "Option B", "Option C", "Option D"],
        "correctAnswer": "Option A",
        "explanation": "Detailed explanation",
        "marks": 1
      }},
      {{
        "id": 2,
        "type": "saq",
        "question": "Question text here?",
        "correctAnswer": "Expected answer in 2-3 sentences",
        "explanation": "Additional context",
        "marks": 2
      }},
      {{
        "id": 3,
        "type": "laq",
        "question": "Question text here?",
        "correctAnswer": "Expected detailed answer",
        "explanation": "Additional context",
        "marks": 5
      }}
    ]
  }}
}}

## IMPORTANT GUIDELINES:

1. Questions MUST be based ONLY on content from the PDF
2. Question ids MUST be unique integers starting at 1
3. For MCQs: All 4 options should be plausible, only ONE correct
4. For SAQs: Require 2-3 sentence answers
5. For LAQs: Require detailed multi-paragraph answers
6. Include clear explanations for learning
7. Return ONLY valid JSON, no markdown formatting

Generate the quiz now."#,
        requirements = requirements.join("\n"),
        total = counts.total(),
    )
}

/// Coerce model output into a JSON string: a fenced code block first,
/// falling back to the first balanced top-level object in the text.
pub fn extract_json(text: &str) -> Option<&str> {
    // Fenced block, with or without a language tag
    if let Some(start) = text.find("```") {
        let after_fence = &text[start + 3..];
        let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after_fence[body_start..];
        if let Some(end) = body.find("```") {
            let fenced = body[..end].trim();
            if !fenced.is_empty() {
                return Some(fenced);
            }
        }
    }

    // First balanced top-level object
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse the model's textual response into a quiz. A parse failure is a
/// recoverable upstream error carrying a diagnostic fragment.
pub fn parse_quiz(text: &str) -> Result<GeneratedQuiz, ApiError> {
    let parse_failure = || ApiError::Upstream {
        message: "Failed to parse quiz data".to_string(),
        details: Some(text.chars().take(500).collect()),
    };

    let json_str = extract_json(text).ok_or_else(parse_failure)?;
    let value: serde_json::Value = serde_json::from_str(json_str).map_err(|_| parse_failure())?;

    // The model sometimes nests under "quiz", sometimes not
    let quiz_value = value.get("quiz").cloned().unwrap_or(value);
    serde_json::from_value(quiz_value).map_err(|_| parse_failure())
}

/// Invoke the generative API and parse the response, retrying once on a
/// transient upstream failure.
pub async fn generate(
    gemini: &GeminiClient,
    counts: QuizCounts,
    document: &ReadyDocument,
) -> Result<GeneratedQuiz, ApiError> {
    let prompt = build_prompt(counts);
    let contents = vec![Content::user(vec![
        Part::text(prompt),
        Part::file(document.uri.as_str(), document.mime_type.as_str()),
    ])];

    let text = match gemini.generate_content(config::GEMINI_MODEL, contents.clone()).await {
        Ok(text) => text,
        Err(e) if e.is_recoverable() => {
            tracing::warn!("Quiz generation failed ({}), retrying once", e);
            gemini.generate_content(config::GEMINI_MODEL, contents).await?
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!("Quiz generated, raw response length {}", text.len());
    let quiz = parse_quiz(&text)?;

    let expected = counts.total() as usize;
    if quiz.questions.len() != expected {
        return Err(ApiError::Upstream {
            message: format!(
                "Model returned {} questions, expected {}",
                quiz.questions.len(),
                expected
            ),
            details: None,
        });
    }

    Ok(quiz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QuestionType;

    fn config(mcq: bool, saq: bool, laq: bool, counts: (u32, u32, u32)) -> QuizConfig {
        QuizConfig {
            types: QuizTypes { mcq, saq, laq },
            counts: QuizCounts { mcq: counts.0, saq: counts.1, laq: counts.2 },
        }
    }

    #[test]
    fn effective_counts_zero_unrequested_types() {
        let counts = config(true, false, false, (5, 10, 10)).effective_counts().unwrap();
        assert_eq!(counts, QuizCounts { mcq: 5, saq: 0, laq: 0 });
        assert_eq!(counts.total(), 5);
    }

    #[test]
    fn no_requested_type_is_rejected() {
        let err = config(false, false, false, (5, 5, 5)).effective_counts().unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn out_of_range_count_is_rejected() {
        assert!(config(true, false, false, (0, 0, 0)).effective_counts().is_err());
        assert!(config(true, false, false, (21, 0, 0)).effective_counts().is_err());
        assert!(config(true, false, false, (20, 0, 0)).effective_counts().is_ok());
    }

    #[test]
    fn prompt_enumerates_exact_counts() {
        let prompt = build_prompt(QuizCounts { mcq: 3, saq: 2, laq: 0 });
        assert!(prompt.contains("- 3 Multiple Choice Questions"));
        assert!(prompt.contains("- 2 Short Answer Questions"));
        assert!(!prompt.contains("Long Answer Questions (LAQs) requiring"));
        assert!(prompt.contains(r#""totalQuestions": 5"#));
    }

    #[test]
    fn extract_json_prefers_fenced_block() {
        let text = "Here you go:\n```json\n{\"a\": 1}\n```\ntrailing {\"b\": 2}";
        assert_eq!(extract_json(text), Some("{\"a\": 1}"));
    }

    #[test]
    fn extract_json_finds_bare_object() {
        let text = "Sure! {\"quiz\": {\"title\": \"T\", \"questions\": []}} hope that helps";
        assert_eq!(
            extract_json(text),
            Some("{\"quiz\": {\"title\": \"T\", \"questions\": []}}")
        );
    }

    #[test]
    fn extract_json_ignores_braces_in_strings() {
        let text = r#"{"title": "a } inside", "n": 1}"#;
        assert_eq!(extract_json(text), Some(text));
    }

    #[test]
    fn extract_json_none_for_plain_text() {
        assert_eq!(extract_json("no json here"), None);
    }

    #[test]
    fn parse_quiz_accepts_nested_and_flat() {
        let nested = r#"{"quiz": {"title": "T", "questions": [
            {"id": 1, "type": "mcq", "question": "Q?",
             "options": ["A","B","C","D"], "correctAnswer": "A",
             "explanation": "E", "marks": 1}
        ]}}"#;
        let quiz = parse_quiz(nested).unwrap();
        assert_eq!(quiz.title.as_deref(), Some("T"));
        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.questions[0].question_type, QuestionType::Mcq);

        let flat = r#"{"title": "T", "questions": []}"#;
        assert!(parse_quiz(flat).is_ok());
    }

    #[test]
    fn parse_failure_carries_diagnostic_fragment() {
        let garbage = "x".repeat(1000);
        let err = parse_quiz(&garbage).unwrap_err();
        match err {
            ApiError::Upstream { details: Some(details), .. } => {
                assert_eq!(details.len(), 500);
            }
            other => panic!("expected upstream error with details, got {:?}", other),
        }
    }

    #[test]
    fn parse_quiz_from_markdown_wrapped_response() {
        let text = "Here is your quiz:\n```json\n{\"quiz\":{\"title\":\"Ch1\",\"questions\":[{\"id\":1,\"type\":\"saq\",\"question\":\"Why?\",\"correctAnswer\":\"Because\",\"explanation\":\"E\",\"marks\":2}]}}\n```";
        let quiz = parse_quiz(text).unwrap();
        assert_eq!(quiz.title.as_deref(), Some("Ch1"));
        assert!(quiz.questions[0].options.is_none());
    }
}
