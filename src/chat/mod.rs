//! The chat client: sessions, sidebar, rendering, and the event handler that
//! ties them to the bridge server.
//!
//! # Architecture
//!
//! - [`session`]: the session collection and the active index
//! - [`sidebar`]: per-session labels and the options menu
//! - [`render`]: display-node descriptors and the surfaces that draw them
//! - [`controller`]: submit, attach and session events
//! - [`transport`]: HTTP calls to the bridge
//! - [`commands`]: slash command parsing for the terminal front end
//! - [`config`]: CLI argument parsing and configuration

pub mod commands;
pub mod config;
pub mod controller;
pub mod render;
pub mod session;
pub mod sidebar;
pub mod transport;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ClientArgs, ClientConfig};
pub use controller::{ChatController, Snapshot, SubmitOutcome, TRANSPORT_ERROR_MESSAGE};
pub use render::{
    BufferSurface, DisplayNode, Surface, TerminalSurface, TextBody, draw, format_markup, render,
};
pub use session::{Session, SessionId, SessionStore};
pub use sidebar::{ClickTarget, Sidebar, SidebarAction, SidebarEntry, label_for};
pub use transport::{ChatTransport, DEFAULT_SERVER_URL, HttpTransport};
