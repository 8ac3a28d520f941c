//! Questionnaires

use serde::{Deserialize, Serialize};

/// Top-level fields every questionnaire must declare
pub const REQUIRED_FIELDS: &[&str] = &["id", "title", "questions", "llmConfig"];

/// Kind of answer a question collects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Text,
    Textarea,
    Radio,
    Checkbox,
}

impl QuestionType {
    pub const ALL: [QuestionType; 4] = [Self::Text, Self::Textarea, Self::Radio, Self::Checkbox];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
        }
    }

    /// Choice questions carry an `options` list
    pub fn has_options(&self) -> bool {
        matches!(self, Self::Radio | Self::Checkbox)
    }
}
