//! Configuration types for the terminal client.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved
//! configuration the client runs with.

use arrrg_derive::CommandLine;

use super::transport::DEFAULT_SERVER_URL;

/// Command-line arguments for the geminichat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ClientArgs {
    /// Base URL of the bridge server.
    #[arrrg(optional, "Bridge server URL (default: http://localhost:3000/)", "URL")]
    pub server: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for the terminal client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// The bridge server to talk to.
    pub server: String,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ClientConfig {
    /// Creates a new ClientConfig with default values.
    pub fn new() -> Self {
        Self {
            server: DEFAULT_SERVER_URL.to_string(),
            use_color: true,
        }
    }

    /// Sets the server URL.
    pub fn with_server(mut self, server: String) -> Self {
        self.server = server;
        self
    }

    /// Disables colored output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ClientArgs> for ClientConfig {
    fn from(args: ClientArgs) -> Self {
        ClientConfig {
            server: args.server.unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            use_color: !args.no_color,
        }
    }
}
