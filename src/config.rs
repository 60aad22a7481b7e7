//! Configuration for the bridge server.
//!
//! Command-line arguments are parsed with `arrrg` and resolved into a
//! [`ServerConfig`] with defaults filled in from the environment.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use arrrg_derive::CommandLine;

use crate::client::DEFAULT_MODEL;
use crate::error::{Error, Result};

/// Port used when neither `--addr` nor `PORT` is given.
pub const DEFAULT_PORT: u16 = 3000;

/// Largest accepted request body (base64 images are large).
pub const DEFAULT_BODY_LIMIT: usize = 15 * 1024 * 1024;

/// Command-line arguments for the geminichat-server tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ServerArgs {
    /// Address to listen on.
    #[arrrg(optional, "Address to bind (default: 0.0.0.0:$PORT or 0.0.0.0:3000)", "ADDR")]
    pub addr: Option<String>,

    /// Directory of static files served for unmatched paths.
    #[arrrg(optional, "Directory of static files (default: public)", "DIR")]
    pub public_dir: Option<String>,

    /// Model to use for chat and image description.
    #[arrrg(optional, "Model to use (default: gemini-1.5-flash)", "MODEL")]
    pub model: Option<String>,

    /// Base URL of the provider API.
    #[arrrg(optional, "Provider API base URL", "URL")]
    pub base_url: Option<String>,
}

/// Resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on.
    pub addr: SocketAddr,

    /// Directory of static files.
    pub public_dir: PathBuf,

    /// The model name passed to the provider.
    pub model: String,

    /// Provider base URL override.
    pub base_url: Option<String>,

    /// Largest accepted request body in bytes.
    pub body_limit: usize,
}

impl ServerConfig {
    /// Creates a new ServerConfig with default values.
    ///
    /// Defaults:
    /// - Address: 0.0.0.0:3000
    /// - Public directory: public
    /// - Model: gemini-1.5-flash
    /// - Body limit: 15 MiB
    pub fn new() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            public_dir: PathBuf::from("public"),
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Resolve arguments against the environment.
    ///
    /// `PORT` is consulted only when `--addr` is absent.
    pub fn from_args(args: ServerArgs) -> Result<Self> {
        Self::from_args_and_port(args, env::var("PORT").ok())
    }

    fn from_args_and_port(args: ServerArgs, port: Option<String>) -> Result<Self> {
        let addr = match (args.addr, port) {
            (Some(addr), _) => addr.parse::<SocketAddr>().map_err(|e| {
                Error::configuration(format!("invalid --addr {addr:?}: {e}"))
            })?,
            (None, Some(port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|e| Error::configuration(format!("invalid PORT {port:?}: {e}")))?;
                SocketAddr::from(([0, 0, 0, 0], port))
            }
            (None, None) => ServerConfig::new().addr,
        };
        let mut config = ServerConfig::new().with_addr(addr);
        if let Some(dir) = args.public_dir {
            config = config.with_public_dir(PathBuf::from(dir));
        }
        if let Some(model) = args.model {
            config = config.with_model(model);
        }
        Ok(config.with_base_url(args.base_url))
    }

    /// Sets the listen address.
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    /// Sets the static file directory.
    pub fn with_public_dir(mut self, dir: PathBuf) -> Self {
        self.public_dir = dir;
        self
    }

    /// Sets the model.
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Sets the provider base URL.
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    /// Sets the request body limit.
    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}
