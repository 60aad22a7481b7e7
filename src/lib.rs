// Public modules
pub mod bridge;
pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod observability;
pub mod resize;
pub mod server;
pub mod types;

// Re-exports
pub use bridge::{ChatBridge, ConversationMemory, MemoryState};
pub use client::{Gemini, GenerativeModel};
pub use config::{ServerArgs, ServerConfig};
pub use error::{Error, ErrorCategory, Result};
pub use observability::register_biometrics;
pub use resize::ResizeDirective;
pub use server::{AppState, router, serve};
pub use types::*;
