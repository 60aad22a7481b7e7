use serde::{Deserialize, Serialize};

use crate::types::{Message, MessageKind, Role};

/// Body of `POST /api/chat`.
///
/// Every field is optional on the wire.  Older clients send the prompt under
/// `message`, which is accepted as an alias.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The user's prompt text.
    #[serde(default, alias = "message", skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// Attached images as bare base64 payloads (no data URI prefix).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,

    /// Prior turns of the conversation, oldest first.
    ///
    /// `None` (field absent) asks the server to use its own memory; an empty
    /// list means a conversation that has just started.
    #[serde(default)]
    pub history: Option<Vec<HistoryEntry>>,
}

impl ChatRequest {
    /// Create a request carrying only a prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Self::default()
        }
    }

    /// Attach images to the request.
    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    /// Set the conversation history.
    pub fn with_history(mut self, history: Vec<HistoryEntry>) -> Self {
        self.history = Some(history);
        self
    }

    /// The trimmed prompt, if it has any content.
    pub fn prompt_text(&self) -> Option<&str> {
        self.prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// Role of a history entry, in the client's vocabulary.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    /// Typed by the person chatting.
    User,
    /// Produced by the model.
    Bot,
}

/// One prior turn of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    /// Who produced the turn.
    pub role: HistoryRole,
    /// The text of the turn.
    pub content: String,
}

impl HistoryEntry {
    /// Create a user entry.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::User,
            content: content.into(),
        }
    }

    /// Create a bot entry.
    pub fn bot(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::Bot,
            content: content.into(),
        }
    }

    /// Convert a text message into a history entry.  Image messages have no
    /// textual history form and yield `None`.
    pub fn from_message(message: &Message) -> Option<Self> {
        if message.kind != MessageKind::Text {
            return None;
        }
        let role = match message.role {
            Role::User => HistoryRole::User,
            Role::Bot => HistoryRole::Bot,
        };
        Some(Self {
            role,
            content: message.content.clone(),
        })
    }
}
