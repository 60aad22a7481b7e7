use serde::{Deserialize, Serialize};

use crate::types::HistoryRole;

/// Role of a turn in the provider's vocabulary.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentRole {
    /// User turn.
    User,
    /// Model turn.
    Model,
}

impl From<HistoryRole> for ContentRole {
    fn from(role: HistoryRole) -> Self {
        match role {
            HistoryRole::User => ContentRole::User,
            HistoryRole::Bot => ContentRole::Model,
        }
    }
}

/// Inline binary data attached to a turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// MIME type of the data.
    pub mime_type: String,
    /// Base64 payload.
    pub data: String,
}

/// One part of a turn: either text or inline data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Part {
    /// A text part.
    Text {
        /// The text.
        text: String,
    },
    /// An inline binary part.
    InlineData {
        /// The payload.
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl Part {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    /// Create an inline data part.
    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        }
    }

    /// The text of a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            Part::InlineData { .. } => None,
        }
    }
}

/// One turn of the conversation sent to, or returned by, the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    /// Who produced the turn.  The provider may omit it in replies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<ContentRole>,
    /// The parts of the turn.
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Create a turn with the given role and parts.
    pub fn new(role: ContentRole, parts: Vec<Part>) -> Self {
        Self {
            role: Some(role),
            parts,
        }
    }

    /// Create a single-text-part turn.
    pub fn text(role: ContentRole, text: impl Into<String>) -> Self {
        Self::new(role, vec![Part::text(text)])
    }
}

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateContentRequest {
    /// The conversation, oldest turn first; the last turn is the new input.
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// Create a new request.
    pub fn new(contents: Vec<Content>) -> Self {
        Self { contents }
    }
}

/// A single candidate answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The answer, absent when generation was blocked.
    #[serde(default)]
    pub content: Option<Content>,
    /// Why generation stopped.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Response body for `models/{model}:generateContent`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerateContentResponse {
    /// Candidate answers; usually exactly one.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// A response with one candidate holding the given text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(Content::text(ContentRole::Model, text)),
                finish_reason: Some("STOP".to_string()),
            }],
        }
    }

    /// The concatenated text of the first candidate, if it has any.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().filter_map(Part::as_text).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
