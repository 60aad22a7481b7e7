//! The chat bridge.
//!
//! Maps a stateless HTTP chat call onto the provider's conversation API and
//! folds every recoverable failure into a normal reply whose text explains
//! what went wrong.  The bridge also keeps a single server-held conversation
//! memory for callers that omit the `history` field entirely; a request that
//! carries a history, even an empty one, is answered from that history alone.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::sync::Mutex;

use crate::client::GenerativeModel;
use crate::error::{Error, ErrorCategory, Result, classify, user_message};
use crate::observability::{
    BRIDGE_ANALYZE_REQUESTS, BRIDGE_CHAT_REQUESTS, BRIDGE_CLEARS, BRIDGE_EMPTY_INPUT,
    BRIDGE_EMPTY_REPLY, BRIDGE_RATE_LIMITED, BRIDGE_UNAVAILABLE, BRIDGE_UNKNOWN,
};
use crate::resize::ResizeDirective;
use crate::types::attachment::{sniff_mime_type, strip_data_uri};
use crate::types::{
    AnalyzeImageReply, AnalyzeImageRequest, ChatReply, ChatRequest, ClearReply, Content,
    ContentRole, GenerateContentRequest, HistoryEntry, Part,
};

/// Instruction sent alongside an image on the analyze path.
pub const DESCRIBE_IMAGE_PROMPT: &str = "Describe this image in detail.";

/// State of the server-held conversation memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryState {
    /// No exchange has been recorded since start or the last clear.
    Empty,
    /// At least one exchange is held.
    Active,
}

/// The conversation the server remembers between requests.
#[derive(Debug, Default)]
pub struct ConversationMemory {
    entries: Vec<HistoryEntry>,
}

impl ConversationMemory {
    /// The current state.
    pub fn state(&self) -> MemoryState {
        if self.entries.is_empty() {
            MemoryState::Empty
        } else {
            MemoryState::Active
        }
    }

    /// Record one completed exchange.
    pub fn record(&mut self, prompt: &str, reply: &str) {
        self.entries.push(HistoryEntry::user(prompt));
        self.entries.push(HistoryEntry::bot(reply));
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The remembered turns, oldest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }
}

/// Translates chat requests into provider calls and provider results into
/// replies.
pub struct ChatBridge<M: GenerativeModel> {
    model: M,
    memory: Mutex<ConversationMemory>,
}

impl<M: GenerativeModel> ChatBridge<M> {
    /// Create a bridge around a generative model.
    pub fn new(model: M) -> Self {
        Self {
            model,
            memory: Mutex::new(ConversationMemory::default()),
        }
    }

    /// The underlying model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Handle `POST /api/chat`.  Never fails: errors become reply text.
    pub async fn chat(&self, request: ChatRequest) -> ChatReply {
        BRIDGE_CHAT_REQUESTS.click();
        tracing::info!(
            prompt = request.prompt_text().unwrap_or_default(),
            images = request.images.len(),
            history = request.history.as_ref().map(Vec::len),
            "chat request"
        );
        match self.try_chat(request).await {
            Ok(reply) => reply,
            Err(err) => ChatReply::text(self.normalize(&err)),
        }
    }

    /// Handle `POST /api/analyze-image`.  Never fails: errors become the
    /// description text.
    pub async fn analyze_image(&self, request: AnalyzeImageRequest) -> AnalyzeImageReply {
        BRIDGE_ANALYZE_REQUESTS.click();
        tracing::info!(mime_type = %request.mime_type, "analyze-image request");
        let description = match self.try_analyze_image(request).await {
            Ok(description) => description,
            Err(err) => self.normalize(&err),
        };
        AnalyzeImageReply { description }
    }

    /// Handle `POST /api/clear`.  Idempotent.
    pub async fn clear_history(&self) -> ClearReply {
        BRIDGE_CLEARS.click();
        self.memory.lock().await.clear();
        tracing::info!("conversation memory cleared");
        ClearReply::ok()
    }

    /// The current state of the server-held memory.
    pub async fn memory_state(&self) -> MemoryState {
        self.memory.lock().await.state()
    }

    /// A copy of the server-held memory.
    pub async fn memory_entries(&self) -> Vec<HistoryEntry> {
        self.memory.lock().await.entries().to_vec()
    }

    async fn try_chat(&self, request: ChatRequest) -> Result<ChatReply> {
        let prompt = request.prompt_text().map(str::to_string);
        if prompt.is_none() && request.images.is_empty() {
            return Err(Error::EmptyInput);
        }

        if let Some(directive) = prompt.as_deref().and_then(ResizeDirective::parse)
            && !request.images.is_empty()
        {
            let resized = directive.apply(&request.images).await?;
            tracing::info!(
                width = directive.width,
                height = directive.height,
                images = resized.len(),
                "resized images"
            );
            return Ok(ChatReply::with_resized_images(
                directive.confirmation(),
                resized,
            ));
        }

        // The lock is held across the provider call so concurrent exchanges
        // are recorded in the order they were answered, without lost updates.
        let mut memory = self.memory.lock().await;
        let uses_memory = request.history.is_none();
        let history = match request.history {
            Some(history) => history,
            None => memory.entries().to_vec(),
        };
        let contents = build_contents(&history, &request.images, prompt.as_deref())?;
        let response = self
            .model
            .generate_content(GenerateContentRequest::new(contents))
            .await
            .map_err(provider_error)?;
        let text = response.text().ok_or(Error::EmptyProviderReply)?;
        tracing::debug!(reply = %text, "model reply");
        if uses_memory && let Some(prompt) = prompt.as_deref() {
            memory.record(prompt, &text);
        }
        Ok(ChatReply::text(text))
    }

    async fn try_analyze_image(&self, request: AnalyzeImageRequest) -> Result<String> {
        if request.base64_data.trim().is_empty() {
            return Err(Error::EmptyInput);
        }
        let mime_type = if request.mime_type.trim().is_empty() {
            "image/jpeg".to_string()
        } else {
            request.mime_type
        };
        let contents = vec![Content::new(
            ContentRole::User,
            vec![
                Part::inline(mime_type, request.base64_data),
                Part::text(DESCRIBE_IMAGE_PROMPT),
            ],
        )];
        let response = self
            .model
            .generate_content(GenerateContentRequest::new(contents))
            .await
            .map_err(provider_error)?;
        response.text().ok_or(Error::EmptyProviderReply)
    }

    fn normalize(&self, err: &Error) -> String {
        let category = classify(err);
        match category {
            ErrorCategory::EmptyInput => BRIDGE_EMPTY_INPUT.click(),
            ErrorCategory::EmptyProviderReply => BRIDGE_EMPTY_REPLY.click(),
            ErrorCategory::RateLimited => BRIDGE_RATE_LIMITED.click(),
            ErrorCategory::Unavailable => BRIDGE_UNAVAILABLE.click(),
            ErrorCategory::Unknown => BRIDGE_UNKNOWN.click(),
        }
        match category {
            ErrorCategory::EmptyInput => tracing::debug!("empty input"),
            ErrorCategory::EmptyProviderReply => {
                tracing::warn!("empty response from provider")
            }
            _ => tracing::error!(category = category.as_str(), error = %err, "provider error"),
        }
        user_message(err)
    }
}

/// Build the provider conversation: history turns, then one user turn with
/// the images followed by the prompt.
pub fn build_contents(
    history: &[HistoryEntry],
    images: &[String],
    prompt: Option<&str>,
) -> Result<Vec<Content>> {
    let mut contents: Vec<Content> = history
        .iter()
        .map(|entry| Content::text(entry.role.into(), entry.content.clone()))
        .collect();
    let mut parts = Vec::with_capacity(images.len() + 1);
    for image in images {
        let data = strip_data_uri(image);
        let bytes = BASE64.decode(data)?;
        parts.push(Part::inline(sniff_mime_type(&bytes), data));
    }
    if let Some(prompt) = prompt {
        parts.push(Part::text(prompt));
    }
    contents.push(Content::new(ContentRole::User, parts));
    Ok(contents)
}

// Provider failures are reduced to the classification categories here so the
// original text survives only inside the Unknown message.
fn provider_error(err: Error) -> Error {
    match classify(&err) {
        ErrorCategory::RateLimited => Error::rate_limited(err.to_string()),
        ErrorCategory::Unavailable => Error::unavailable(err.to_string()),
        _ => Error::unknown(err.to_string()),
    }
}
