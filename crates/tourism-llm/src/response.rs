//! Backend response shapes.

use serde::Deserialize;

/// What a backend returned.
///
/// Some backends wrap their output in an object with an `answer` field,
/// others return bare text. Callers go through [`GenerationResponse::into_text`]
/// and never inspect the shape themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResponse {
    StructuredAnswer { text: String },
    RawText(String),
}

#[derive(Deserialize)]
struct AnswerEnvelope {
    answer: String,
}

impl GenerationResponse {
    /// Classify backend text. A JSON object with a string `answer` field is
    /// structured; anything else, malformed JSON included, is raw.
    pub fn from_backend_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.starts_with('{') {
            if let Ok(envelope) = serde_json::from_str::<AnswerEnvelope>(trimmed) {
                return GenerationResponse::StructuredAnswer {
                    text: envelope.answer,
                };
            }
        }
        GenerationResponse::RawText(text)
    }

    pub fn into_text(self) -> String {
        match self {
            GenerationResponse::StructuredAnswer { text } => text,
            GenerationResponse::RawText(text) => text,
        }
    }

    pub fn as_text(&self) -> &str {
        match self {
            GenerationResponse::StructuredAnswer { text } => text,
            GenerationResponse::RawText(text) => text,
        }
    }
}

impl From<String> for GenerationResponse {
    fn from(text: String) -> Self {
        Self::from_backend_text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_answer() {
        let response = GenerationResponse::from_backend_text(r#"{"answer": "Lalibela"}"#);
        assert_eq!(
            response,
            GenerationResponse::StructuredAnswer {
                text: "Lalibela".to_string()
            }
        );
        assert_eq!(response.into_text(), "Lalibela");
    }

    #[test]
    fn test_raw_text() {
        let response = GenerationResponse::from_backend_text("The churches are rock-hewn.");
        assert_eq!(response.as_text(), "The churches are rock-hewn.");
        assert!(matches!(response, GenerationResponse::RawText(_)));
    }

    #[test]
    fn test_malformed_json_is_raw() {
        let text = r#"{"answer": "unterminated"#;
        let response = GenerationResponse::from_backend_text(text);
        assert_eq!(response, GenerationResponse::RawText(text.to_string()));
    }

    #[test]
    fn test_object_without_answer_is_raw() {
        let text = r#"{"result": "x"}"#;
        assert_eq!(
            GenerationResponse::from_backend_text(text).into_text(),
            text
        );
    }

    #[test]
    fn test_non_string_answer_is_raw() {
        let text = r#"{"answer": 42}"#;
        assert!(matches!(
            GenerationResponse::from_backend_text(text),
            GenerationResponse::RawText(_)
        ));
    }
}
