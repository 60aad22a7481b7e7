//! Sidebar entries and the per-entry options menu.

use crate::error::Result;

use super::session::{Session, SessionStore};

/// Label for a session with no user text.
pub const NEW_CHAT_LABEL: &str = "New Chat";

/// Longest label, in characters, before truncation.
pub const LABEL_MAX_CHARS: usize = 40;

const ELLIPSIS: char = '…';

/// Derive a session's sidebar label from its first user text message.
pub fn label_for(session: &Session) -> String {
    let first = session.messages().iter().find(|m| m.is_user_text());
    match first {
        Some(message) => truncate_label(&message.content),
        None => NEW_CHAT_LABEL.to_string(),
    }
}

fn truncate_label(content: &str) -> String {
    let mut chars = content.chars();
    let mut label: String = chars.by_ref().take(LABEL_MAX_CHARS).collect();
    if chars.next().is_some() {
        label.push(ELLIPSIS);
    }
    label
}

/// One interactive row of the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarEntry {
    pub index: usize,
    pub label: String,
    pub active: bool,
    pub menu_open: bool,
}

/// The part of an entry a user interacted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    /// The entry itself.
    Body,
    /// The "delete" item of the entry's options menu.
    Delete,
    /// The button that opens the options menu.
    MenuTrigger,
}

/// A store mutation requested through the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarAction {
    Select(usize),
    Delete(usize),
}

/// Tracks which entry, if any, has its options menu open.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Sidebar {
    open_menu: Option<usize>,
}

impl Sidebar {
    pub fn new() -> Self {
        Self::default()
    }

    /// The entry whose menu is open.
    pub fn open_menu(&self) -> Option<usize> {
        self.open_menu
    }

    /// One entry per session, in collection order.
    pub fn render(&self, store: &SessionStore) -> Vec<SidebarEntry> {
        store
            .sessions()
            .iter()
            .enumerate()
            .map(|(index, session)| SidebarEntry {
                index,
                label: label_for(session),
                active: index == store.active_index(),
                menu_open: self.open_menu == Some(index),
            })
            .collect()
    }

    /// Map an interaction on entry `index` to an action.
    ///
    /// A menu-trigger click only toggles the menu; opening one menu closes
    /// any other.  A delete click yields `Delete` and never also selects.
    pub fn click(&mut self, index: usize, target: ClickTarget) -> Option<SidebarAction> {
        match target {
            ClickTarget::Body => {
                self.open_menu = None;
                Some(SidebarAction::Select(index))
            }
            ClickTarget::Delete => {
                self.open_menu = None;
                Some(SidebarAction::Delete(index))
            }
            ClickTarget::MenuTrigger => {
                self.open_menu = if self.open_menu == Some(index) {
                    None
                } else {
                    Some(index)
                };
                None
            }
        }
    }

    /// Any interaction outside an open menu closes it.
    pub fn outside_interaction(&mut self) {
        self.open_menu = None;
    }

    /// Apply `action` to `store`.
    pub fn dispatch(&mut self, action: SidebarAction, store: &mut SessionStore) -> Result<()> {
        match action {
            SidebarAction::Select(index) => store.select_session(index),
            SidebarAction::Delete(index) => {
                // Positions shift on delete.
                self.open_menu = None;
                store.delete_session(index)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;

    fn session_with(messages: Vec<Message>) -> Session {
        let mut store = SessionStore::init();
        for message in messages {
            store.append_message(0, message).unwrap();
        }
        store.active().clone()
    }

    #[test]
    fn label_truncation() {
        let forty = "a".repeat(40);
        let forty_one = "b".repeat(41);
        assert_eq!(label_for(&session_with(vec![Message::user_text(&forty)])), forty);
        assert_eq!(
            label_for(&session_with(vec![Message::user_text(&forty_one)])),
            format!("{}…", "b".repeat(40))
        );
    }

    #[test]
    fn label_counts_characters_not_bytes() {
        let text = "é".repeat(41);
        let label = label_for(&session_with(vec![Message::user_text(&text)]));
        assert_eq!(label.chars().count(), 41);
        assert!(label.ends_with('…'));
    }

    #[test]
    fn label_placeholder() {
        assert_eq!(label_for(&session_with(vec![])), NEW_CHAT_LABEL);
        assert_eq!(
            label_for(&session_with(vec![Message::bot_text("hello")])),
            NEW_CHAT_LABEL
        );
        assert_eq!(
            label_for(&session_with(vec![Message::user_image("data:image/png;base64,AAAA")])),
            NEW_CHAT_LABEL
        );
    }

    #[test]
    fn label_uses_first_user_text() {
        let session = session_with(vec![
            Message::bot_text("welcome"),
            Message::user_image("data:image/png;base64,AAAA"),
            Message::user_text("first"),
            Message::user_text("second"),
        ]);
        assert_eq!(label_for(&session), "first");
    }

    #[test]
    fn render_marks_active_and_menu() {
        let mut store = SessionStore::init();
        store.append_message(0, Message::user_text("hello")).unwrap();
        store.create_session();
        let mut sidebar = Sidebar::new();
        assert_eq!(sidebar.click(0, ClickTarget::MenuTrigger), None);

        let entries = sidebar.render(&store);
        assert_eq!(
            entries,
            vec![
                SidebarEntry {
                    index: 0,
                    label: "hello".to_string(),
                    active: false,
                    menu_open: true,
                },
                SidebarEntry {
                    index: 1,
                    label: NEW_CHAT_LABEL.to_string(),
                    active: true,
                    menu_open: false,
                },
            ]
        );
    }

    #[test]
    fn at_most_one_menu_open() {
        let mut sidebar = Sidebar::new();
        sidebar.click(0, ClickTarget::MenuTrigger);
        sidebar.click(2, ClickTarget::MenuTrigger);
        assert_eq!(sidebar.open_menu(), Some(2));
        sidebar.click(2, ClickTarget::MenuTrigger);
        assert_eq!(sidebar.open_menu(), None);
        sidebar.click(1, ClickTarget::MenuTrigger);
        sidebar.outside_interaction();
        assert_eq!(sidebar.open_menu(), None);
    }

    #[test]
    fn delete_click_does_not_select() {
        let mut store = SessionStore::init();
        store.create_session();
        store.create_session();
        store.select_session(1).unwrap();
        let mut sidebar = Sidebar::new();
        sidebar.click(2, ClickTarget::MenuTrigger);

        let action = sidebar.click(2, ClickTarget::Delete);
        assert_eq!(action, Some(SidebarAction::Delete(2)));
        sidebar.dispatch(action.unwrap(), &mut store).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.active_index(), 1);
        assert_eq!(sidebar.open_menu(), None);
    }

    #[test]
    fn body_click_selects() {
        let mut store = SessionStore::init();
        store.create_session();
        let mut sidebar = Sidebar::new();
        let action = sidebar.click(0, ClickTarget::Body).unwrap();
        sidebar.dispatch(action, &mut store).unwrap();
        assert_eq!(store.active_index(), 0);

        let err = sidebar
            .dispatch(SidebarAction::Select(9), &mut store)
            .unwrap_err();
        assert!(err.is_out_of_range());
    }
}
