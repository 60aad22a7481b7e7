use serde::{Deserialize, Serialize};

/// Body returned by `POST /api/chat`.
///
/// Failures the bridge recovers from are carried in `response` as a
/// human-readable warning; the HTTP status is 200 either way.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    /// Text to show as the bot's message.
    pub response: String,

    /// Base64 JPEG payloads produced by a resize directive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resized_images: Option<Vec<String>>,
}

impl ChatReply {
    /// A text-only reply.
    pub fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            resized_images: None,
        }
    }

    /// A reply carrying resized images.
    pub fn with_resized_images(response: impl Into<String>, images: Vec<String>) -> Self {
        Self {
            response: response.into(),
            resized_images: Some(images),
        }
    }
}
