use serde::{Deserialize, Serialize};

/// Who produced a message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person chatting.
    User,
    /// The model, or the bridge speaking on its behalf.
    Bot,
}

impl Role {
    /// The lowercase name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Bot => "bot",
        }
    }
}

/// What a message's content holds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Plain text.
    Text,
    /// A data reference (`data:` URI) to an image.
    Image,
}

/// One entry in a chat session.  Messages are never edited once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Who produced the message.
    pub role: Role,
    /// Text, or an image data reference.
    pub content: String,
    /// How to interpret `content`.
    pub kind: MessageKind,
}

impl Message {
    /// Create a new message.
    pub fn new(role: Role, content: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            role,
            content: content.into(),
            kind,
        }
    }

    /// A text message typed by the user.
    pub fn user_text(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, MessageKind::Text)
    }

    /// A text message from the bot.
    pub fn bot_text(content: impl Into<String>) -> Self {
        Self::new(Role::Bot, content, MessageKind::Text)
    }

    /// An image uploaded by the user.
    pub fn user_image(data_uri: impl Into<String>) -> Self {
        Self::new(Role::User, data_uri, MessageKind::Image)
    }

    /// An image produced by the bridge.
    pub fn bot_image(data_uri: impl Into<String>) -> Self {
        Self::new(Role::Bot, data_uri, MessageKind::Image)
    }

    /// True if this is a user text message.
    pub fn is_user_text(&self) -> bool {
        self.role == Role::User && self.kind == MessageKind::Text
    }
}
