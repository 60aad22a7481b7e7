// Public modules
pub mod analyze_image;
pub mod attachment;
pub mod chat_reply;
pub mod chat_request;
pub mod clear_reply;
pub mod generate_content;
pub mod message;

// Re-exports
pub use analyze_image::{AnalyzeImageReply, AnalyzeImageRequest};
pub use attachment::Attachment;
pub use chat_reply::ChatReply;
pub use chat_request::{ChatRequest, HistoryEntry, HistoryRole};
pub use clear_reply::ClearReply;
pub use generate_content::{
    Candidate, Content, ContentRole, GenerateContentRequest, GenerateContentResponse, InlineData,
    Part,
};
pub use message::{Message, MessageKind, Role};
