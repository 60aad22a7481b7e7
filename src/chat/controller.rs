//! The client's event handler.
//!
//! [`ChatController`] owns the session store and the sidebar, and turns user
//! events into store mutations and bridge calls.  The store lock is never held
//! across a network call; a reply is appended to the session that asked for
//! it, located again by [`SessionId`] once the reply arrives.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_SUBMITS, CLIENT_TRANSPORT_ERRORS};
use crate::types::{AnalyzeImageRequest, Attachment, ChatRequest, HistoryEntry, Message};

use super::render::{self, DisplayNode, Surface};
use super::session::{SessionId, SessionStore};
use super::sidebar::{ClickTarget, Sidebar, SidebarEntry};
use super::transport::ChatTransport;

/// Shown when the bridge could not be reached.
pub const TRANSPORT_ERROR_MESSAGE: &str =
    "❌ Failed to reach the server. Check your connection and try again.";

/// Media type of images produced by a resize.
const RESIZED_MIME_TYPE: &str = "image/jpeg";

/// What became of a submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The submission went out and its reply (or error) has been appended.
    Sent,
    /// Another submission was still in flight; nothing changed.
    Busy,
    /// Nothing to send.
    Ignored,
}

/// Everything needed to draw the client at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub sidebar: Vec<SidebarEntry>,
    pub nodes: Vec<DisplayNode>,
    pub active: usize,
}

struct ClientState {
    store: SessionStore,
    sidebar: Sidebar,
}

/// Clears the in-flight flag when dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives the sessions, the sidebar and the bridge.
pub struct ChatController<T: ChatTransport> {
    transport: T,
    state: Mutex<ClientState>,
    in_flight: AtomicBool,
}

impl<T: ChatTransport> ChatController<T> {
    /// A controller with one empty session.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: Mutex::new(ClientState {
                store: SessionStore::init(),
                sidebar: Sidebar::new(),
            }),
            in_flight: AtomicBool::new(false),
        }
    }

    /// True while a submission is waiting on the bridge.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Send `prompt`, and the active session's pending attachment if any.
    pub async fn submit(&self, prompt: &str) -> SubmitOutcome {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            return SubmitOutcome::Busy;
        };
        let prompt = prompt.trim();

        let (id, pending, history) = {
            let mut state = self.state.lock().await;
            let store = &mut state.store;
            let index = store.active_index();
            if prompt.is_empty() && store.active().pending_attachment().is_none() {
                return SubmitOutcome::Ignored;
            }
            let id = store.active().id();
            let history: Vec<HistoryEntry> = store
                .active()
                .messages()
                .iter()
                .filter_map(HistoryEntry::from_message)
                .collect();
            let pending = store.take_pending_attachment(index).ok().flatten();
            if let Some(attachment) = &pending {
                append_logged(store, index, Message::user_image(attachment.data_uri()));
            }
            if !prompt.is_empty() {
                append_logged(store, index, Message::user_text(prompt));
            }
            (id, pending, history)
        };
        CLIENT_SUBMITS.click();
        tracing::debug!(
            session = id.get(),
            has_prompt = !prompt.is_empty(),
            has_image = pending.is_some(),
            history = history.len(),
            "submitting"
        );

        let replies = match pending {
            Some(attachment) if prompt.is_empty() => {
                let request = AnalyzeImageRequest::from(&attachment);
                match self.transport.analyze_image(request).await {
                    Ok(reply) => vec![Message::bot_text(reply.description)],
                    Err(err) => transport_failure(&err),
                }
            }
            pending => {
                let mut request = ChatRequest::new(prompt).with_history(history);
                if let Some(attachment) = pending {
                    request = request.with_images(vec![attachment.data]);
                }
                match self.transport.chat(request).await {
                    Ok(reply) => {
                        let mut messages = vec![Message::bot_text(reply.response)];
                        for image in reply.resized_images.unwrap_or_default() {
                            messages.push(Message::bot_image(format!(
                                "data:{RESIZED_MIME_TYPE};base64,{image}"
                            )));
                        }
                        messages
                    }
                    Err(err) => transport_failure(&err),
                }
            }
        };

        let mut state = self.state.lock().await;
        match state.store.position_of(id) {
            Some(index) => {
                for message in replies {
                    append_logged(&mut state.store, index, message);
                }
            }
            None => {
                tracing::warn!(
                    session = id.get(),
                    "session deleted before reply arrived; dropping reply"
                );
            }
        }
        SubmitOutcome::Sent
    }

    /// Hold `attachment` for the active session's next submit.
    pub async fn attach(&self, attachment: Attachment) {
        let mut state = self.state.lock().await;
        tracing::debug!(file = %attachment.file_name, mime = %attachment.mime_type, "attached image");
        state.store.set_pending_attachment(attachment);
    }

    /// Start a new session and make it active.
    pub async fn new_chat(&self) -> usize {
        let mut state = self.state.lock().await;
        state.sidebar.outside_interaction();
        state.store.create_session()
    }

    /// Make the session at `index` active.
    pub async fn select_chat(&self, index: usize) -> Result<()> {
        self.sidebar_click(index, ClickTarget::Body).await
    }

    /// Delete the session at `index`.
    pub async fn delete_chat(&self, index: usize) -> Result<()> {
        self.sidebar_click(index, ClickTarget::Delete).await
    }

    /// Open or close the options menu of entry `index`.
    pub async fn toggle_menu(&self, index: usize) -> Result<()> {
        self.sidebar_click(index, ClickTarget::MenuTrigger).await
    }

    /// Clear the server's memory, then the active session.
    pub async fn clear_chat(&self) {
        let id = self.state.lock().await.store.active().id();
        let result = self.transport.clear().await;
        let mut state = self.state.lock().await;
        match result {
            Ok(reply) if reply.success => {
                if state.store.active().id() == id {
                    state.store.clear_active();
                } else {
                    tracing::warn!(session = id.get(), "active session changed during clear");
                }
            }
            Ok(_) => {
                tracing::warn!("server declined to clear history");
            }
            Err(err) => {
                if let Some(index) = state.store.position_of(id) {
                    for message in transport_failure(&err) {
                        append_logged(&mut state.store, index, message);
                    }
                }
            }
        }
    }

    /// The sidebar and the active session's nodes.
    pub async fn snapshot(&self) -> Snapshot {
        let state = self.state.lock().await;
        Snapshot {
            sidebar: state.sidebar.render(&state.store),
            nodes: render::render(state.store.active()),
            active: state.store.active_index(),
        }
    }

    /// Redraw the active session on `surface`.
    pub async fn draw(&self, surface: &mut dyn Surface) {
        let state = self.state.lock().await;
        render::draw(state.store.active(), surface);
    }

    /// Id of the active session.
    pub async fn active_id(&self) -> SessionId {
        self.state.lock().await.store.active().id()
    }

    async fn sidebar_click(&self, index: usize, target: ClickTarget) -> Result<()> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        match state.sidebar.click(index, target) {
            Some(action) => state.sidebar.dispatch(action, &mut state.store),
            None if index < state.store.len() => Ok(()),
            None => {
                state.sidebar.outside_interaction();
                Err(Error::out_of_range(index, state.store.len()))
            }
        }
    }
}

fn append_logged(store: &mut SessionStore, index: usize, message: Message) -> bool {
    match store.append_message(index, message) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(error = %err, index, "failed to append message");
            false
        }
    }
}

fn transport_failure(err: &Error) -> Vec<Message> {
    CLIENT_TRANSPORT_ERRORS.click();
    tracing::warn!(error = %err, "bridge call failed");
    vec![Message::bot_text(TRANSPORT_ERROR_MESSAGE)]
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::Notify;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::chat::render::{PLACEHOLDER_TEXT, TextBody};
    use crate::types::{AnalyzeImageReply, ChatReply, ClearReply, HistoryRole, Role};

    #[derive(Default)]
    struct FakeTransport {
        gate: Option<Arc<Notify>>,
        fail: bool,
        resized: Option<Vec<String>>,
        chats: std::sync::Mutex<Vec<ChatRequest>>,
        analyses: std::sync::Mutex<Vec<AnalyzeImageRequest>>,
    }

    impl FakeTransport {
        fn gated(gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        async fn wait(&self) -> Result<()> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                return Err(Error::transport("connection refused", None));
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl ChatTransport for FakeTransport {
        async fn chat(&self, request: ChatRequest) -> Result<ChatReply> {
            let prompt = request.prompt_text().unwrap_or_default().to_string();
            self.chats.lock().unwrap().push(request);
            self.wait().await?;
            match &self.resized {
                Some(images) => Ok(ChatReply::with_resized_images(
                    "✅ Image(s) resized to 2×2.",
                    images.clone(),
                )),
                None => Ok(ChatReply::text(format!("re: {prompt}"))),
            }
        }

        async fn analyze_image(&self, request: AnalyzeImageRequest) -> Result<AnalyzeImageReply> {
            self.analyses.lock().unwrap().push(request);
            self.wait().await?;
            Ok(AnalyzeImageReply {
                description: "a cat".to_string(),
            })
        }

        async fn clear(&self) -> Result<ClearReply> {
            self.wait().await?;
            Ok(ClearReply::ok())
        }
    }

    fn texts(snapshot: &Snapshot) -> Vec<String> {
        snapshot
            .nodes
            .iter()
            .map(|node| match node {
                DisplayNode::Placeholder(text) => text.clone(),
                DisplayNode::Text {
                    body: TextBody::Literal(text) | TextBody::Markup(text),
                    ..
                } => text.clone(),
                DisplayNode::Image { src, .. } => src.clone(),
            })
            .collect()
    }

    #[tokio::test]
    async fn submit_appends_prompt_and_reply() {
        let controller = ChatController::new(FakeTransport::default());
        assert_eq!(controller.submit("  hello  ").await, SubmitOutcome::Sent);
        let snapshot = controller.snapshot().await;
        assert_eq!(texts(&snapshot), vec!["hello", "re: hello"]);
        assert_eq!(snapshot.sidebar[0].label, "hello");
    }

    #[tokio::test]
    async fn history_carries_prior_text_messages() {
        let transport = FakeTransport::default();
        let controller = ChatController::new(transport);
        controller.submit("one").await;
        controller.submit("two").await;
        let chats = controller.transport.chats.lock().unwrap();
        assert_eq!(chats[0].history, Some(vec![]));
        let history = chats[1].history.as_ref().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, HistoryRole::User);
        assert_eq!(history[1].role, HistoryRole::Bot);
        assert_eq!(history[1].content, "re: one");
    }

    #[tokio::test]
    async fn empty_submit_is_ignored() {
        let controller = ChatController::new(FakeTransport::default());
        assert_eq!(controller.submit("   ").await, SubmitOutcome::Ignored);
        let snapshot = controller.snapshot().await;
        assert_eq!(texts(&snapshot), vec![PLACEHOLDER_TEXT]);
        assert!(!controller.is_busy());
    }

    #[tokio::test]
    async fn image_only_submit_analyzes() {
        let controller = ChatController::new(FakeTransport::default());
        controller
            .attach(Attachment::new("AAAA", "image/png", "cat.png"))
            .await;
        assert_eq!(controller.submit("").await, SubmitOutcome::Sent);
        let snapshot = controller.snapshot().await;
        assert_eq!(
            texts(&snapshot),
            vec!["data:image/png;base64,AAAA", "a cat"]
        );
        assert_eq!(controller.transport.analyses.lock().unwrap().len(), 1);
        assert!(controller.transport.chats.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn prompt_with_image_goes_to_chat() {
        let transport = FakeTransport {
            resized: Some(vec!["BBBB".to_string()]),
            ..FakeTransport::default()
        };
        let controller = ChatController::new(transport);
        controller
            .attach(Attachment::new("AAAA", "image/png", "cat.png"))
            .await;
        controller.submit("resize to 2x2").await;

        let chats = controller.transport.chats.lock().unwrap().clone();
        assert_eq!(chats[0].images, vec!["AAAA".to_string()]);
        let snapshot = controller.snapshot().await;
        assert_eq!(
            texts(&snapshot),
            vec![
                "data:image/png;base64,AAAA",
                "resize to 2x2",
                "✅ Image(s) resized to 2×2.",
                "data:image/jpeg;base64,BBBB",
            ]
        );
        assert!(matches!(
            snapshot.nodes[3],
            DisplayNode::Image { role: Role::Bot, .. }
        ));
    }

    #[tokio::test]
    async fn transport_failure_appends_one_message() {
        let controller = ChatController::new(FakeTransport::failing());
        assert_eq!(controller.submit("hi").await, SubmitOutcome::Sent);
        let snapshot = controller.snapshot().await;
        assert_eq!(texts(&snapshot), vec!["hi", TRANSPORT_ERROR_MESSAGE]);
    }

    #[tokio::test]
    async fn concurrent_submit_is_busy() {
        let gate = Arc::new(Notify::new());
        let controller = Arc::new(ChatController::new(FakeTransport::gated(gate.clone())));
        let first = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.submit("one").await })
        };
        while !controller.is_busy() {
            tokio::task::yield_now().await;
        }
        assert_eq!(controller.submit("two").await, SubmitOutcome::Busy);
        gate.notify_one();
        assert_eq!(first.await.unwrap(), SubmitOutcome::Sent);
        assert!(!controller.is_busy());
        assert_eq!(controller.transport.chats.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reply_goes_to_submitting_session() {
        let gate = Arc::new(Notify::new());
        let controller = Arc::new(ChatController::new(FakeTransport::gated(gate.clone())));
        let first = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.submit("one").await })
        };
        while !controller.is_busy() {
            tokio::task::yield_now().await;
        }
        assert_eq!(controller.new_chat().await, 1);
        gate.notify_one();
        first.await.unwrap();

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.active, 1);
        assert_eq!(texts(&snapshot), vec![PLACEHOLDER_TEXT]);
        assert_ok!(controller.select_chat(0).await);
        assert_eq!(texts(&controller.snapshot().await), vec!["one", "re: one"]);
    }

    #[tokio::test]
    async fn reply_for_deleted_session_is_dropped() {
        let gate = Arc::new(Notify::new());
        let controller = Arc::new(ChatController::new(FakeTransport::gated(gate.clone())));
        controller.new_chat().await;
        let first = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.submit("one").await })
        };
        while !controller.is_busy() {
            tokio::task::yield_now().await;
        }
        assert_ok!(controller.delete_chat(1).await);
        gate.notify_one();
        first.await.unwrap();

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.sidebar.len(), 1);
        assert_eq!(texts(&snapshot), vec![PLACEHOLDER_TEXT]);
    }

    #[tokio::test]
    async fn sidebar_events() {
        let controller = ChatController::new(FakeTransport::default());
        controller.new_chat().await;
        controller.new_chat().await;
        assert_ok!(controller.toggle_menu(1).await);
        assert!(controller.snapshot().await.sidebar[1].menu_open);
        assert_ok!(controller.delete_chat(2).await);
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.active, 0);
        assert!(snapshot.sidebar.iter().all(|entry| !entry.menu_open));
        assert_err!(controller.select_chat(5).await);
        assert_err!(controller.toggle_menu(5).await);
    }

    #[tokio::test]
    async fn clear_empties_active_session() {
        let controller = ChatController::new(FakeTransport::default());
        controller.submit("hi").await;
        controller.clear_chat().await;
        assert_eq!(texts(&controller.snapshot().await), vec![PLACEHOLDER_TEXT]);
    }

    #[tokio::test]
    async fn clear_failure_reports_transport_error() {
        let controller = ChatController::new(FakeTransport::failing());
        controller.clear_chat().await;
        let snapshot = controller.snapshot().await;
        assert_eq!(texts(&snapshot), vec![TRANSPORT_ERROR_MESSAGE]);
        assert!(matches!(
            &snapshot.nodes[0],
            DisplayNode::Text { role: Role::Bot, .. }
        ));
    }

    #[test]
    fn append_to_missing_session_is_logged_not_applied() {
        let mut store = SessionStore::init();
        assert!(append_logged(&mut store, 0, Message::user_text("kept")));
        assert!(!append_logged(&mut store, 3, Message::user_text("lost")));
        assert_eq!(store.len(), 1);
        assert_eq!(store.active().messages().len(), 1);
        assert_eq!(store.active().messages()[0].content, "kept");
    }

    #[tokio::test]
    async fn draw_to_surface() {
        let controller = ChatController::new(FakeTransport::default());
        controller.submit("hi").await;
        let mut surface = render::BufferSurface::new();
        controller.draw(&mut surface).await;
        controller.draw(&mut surface).await;
        assert_eq!(surface.nodes().len(), 2);
    }
}
