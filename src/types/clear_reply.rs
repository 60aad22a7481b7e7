use serde::{Deserialize, Serialize};

/// Body returned by `POST /api/clear`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClearReply {
    /// Whether the server-held memory was cleared.
    pub success: bool,
}

impl ClearReply {
    /// A successful clear.
    pub fn ok() -> Self {
        Self { success: true }
    }
}
