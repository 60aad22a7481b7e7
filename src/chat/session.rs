//! Multi-session state.
//!
//! The store owns every chat session and the index of the active one.  The
//! collection is never empty and the active index is always in bounds; both
//! are checked after every mutation.

use crate::error::{Error, Result};
use crate::types::{Attachment, Message};

/// Stable identity of a session.
///
/// Positions shift when sessions are deleted; ids never do, and are never
/// reused within a store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// The raw id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// One independent conversation thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: SessionId,
    messages: Vec<Message>,
    pending: Option<Attachment>,
}

impl Session {
    fn new(id: SessionId) -> Self {
        Self {
            id,
            messages: Vec::new(),
            pending: None,
        }
    }

    /// The session's stable id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The messages in display order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// True when the session holds no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The image waiting for the next submit, if any.
    pub fn pending_attachment(&self) -> Option<&Attachment> {
        self.pending.as_ref()
    }
}

/// Owns the session collection and the active index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStore {
    sessions: Vec<Session>,
    active: usize,
    next_id: u64,
}

impl SessionStore {
    /// A store holding one empty, active session.
    pub fn init() -> Self {
        let mut store = Self {
            sessions: Vec::new(),
            active: 0,
            next_id: 0,
        };
        let session = store.fresh_session();
        store.sessions.push(session);
        store.check_invariants();
        store
    }

    /// Number of sessions.  Always at least one.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Always false; present for symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// All sessions in order.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Index of the active session.
    pub fn active_index(&self) -> usize {
        self.active
    }

    /// The active session.
    pub fn active(&self) -> &Session {
        &self.sessions[self.active]
    }

    /// The session at `index`.
    pub fn session(&self, index: usize) -> Result<&Session> {
        self.sessions
            .get(index)
            .ok_or_else(|| Error::out_of_range(index, self.sessions.len()))
    }

    /// The current position of the session with the given id.
    pub fn position_of(&self, id: SessionId) -> Option<usize> {
        self.sessions.iter().position(|s| s.id == id)
    }

    /// Append an empty session, make it active, and return its index.
    pub fn create_session(&mut self) -> usize {
        let session = self.fresh_session();
        self.sessions.push(session);
        self.active = self.sessions.len() - 1;
        self.check_invariants();
        self.active
    }

    /// Make the session at `index` active.
    ///
    /// Out-of-range indices are rejected and leave the store unchanged.
    pub fn select_session(&mut self, index: usize) -> Result<()> {
        self.bounds(index)?;
        self.active = index;
        self.check_invariants();
        Ok(())
    }

    /// Remove the session at `index`.
    ///
    /// Deleting the active session makes position 0 active, whatever session
    /// now lives there.  Deleting a session before the active one keeps the
    /// same session active.  Deleting the only session replaces it with a
    /// fresh empty one.
    pub fn delete_session(&mut self, index: usize) -> Result<()> {
        self.bounds(index)?;
        self.sessions.remove(index);
        if self.sessions.is_empty() {
            let session = self.fresh_session();
            self.sessions.push(session);
            self.active = 0;
        } else if index == self.active {
            self.active = 0;
        } else if index < self.active {
            self.active -= 1;
        }
        self.check_invariants();
        Ok(())
    }

    /// Append a message to the session at `index`.
    pub fn append_message(&mut self, index: usize, message: Message) -> Result<()> {
        self.bounds(index)?;
        self.sessions[index].messages.push(message);
        self.check_invariants();
        Ok(())
    }

    /// Empty the active session's messages, keeping the session.
    pub fn clear_active(&mut self) {
        let active = self.active;
        let session = &mut self.sessions[active];
        session.messages.clear();
        session.pending = None;
        self.check_invariants();
    }

    /// Hold `attachment` on the active session until the next submit,
    /// replacing any attachment already held.
    pub fn set_pending_attachment(&mut self, attachment: Attachment) {
        let active = self.active;
        self.sessions[active].pending = Some(attachment);
    }

    /// Remove and return the pending attachment of the session at `index`.
    pub fn take_pending_attachment(&mut self, index: usize) -> Result<Option<Attachment>> {
        self.bounds(index)?;
        Ok(self.sessions[index].pending.take())
    }

    fn fresh_session(&mut self) -> Session {
        let id = SessionId(self.next_id);
        self.next_id += 1;
        Session::new(id)
    }

    fn bounds(&self, index: usize) -> Result<()> {
        if index < self.sessions.len() {
            Ok(())
        } else {
            Err(Error::out_of_range(index, self.sessions.len()))
        }
    }

    fn check_invariants(&self) {
        debug_assert!(!self.sessions.is_empty(), "session collection is empty");
        debug_assert!(
            self.active < self.sessions.len(),
            "active index {} out of bounds for {} sessions",
            self.active,
            self.sessions.len()
        );
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::init()
    }
}
