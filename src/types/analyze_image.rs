use serde::{Deserialize, Serialize};

use crate::types::Attachment;

/// Body of `POST /api/analyze-image`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeImageRequest {
    /// Bare base64 payload of the image.
    pub base64_data: String,

    /// MIME type of the image, e.g. `image/png`.
    pub mime_type: String,
}

impl AnalyzeImageRequest {
    /// Create a new request.
    pub fn new(base64_data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            base64_data: base64_data.into(),
            mime_type: mime_type.into(),
        }
    }
}

impl From<&Attachment> for AnalyzeImageRequest {
    fn from(attachment: &Attachment) -> Self {
        Self::new(attachment.data.clone(), attachment.mime_type.clone())
    }
}

/// Body returned by `POST /api/analyze-image`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyzeImageReply {
    /// The provider's description, or a warning on failure.
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_camel_case() {
        let request = AnalyzeImageRequest::new("AAAA", "image/png");
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"base64Data":"AAAA","mimeType":"image/png"}"#);
    }

    #[test]
    fn reply_deserialization() {
        let reply: AnalyzeImageReply =
            serde_json::from_str(r#"{"description":"a cat"}"#).unwrap();
        assert_eq!(reply.description, "a cat");
    }
}
