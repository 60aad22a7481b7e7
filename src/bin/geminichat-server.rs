//! Bridge server between the chat client and the Gemini API.
//!
//! # Usage
//!
//! ```bash
//! export GEMINI_API_KEY=...
//!
//! # Listen on 0.0.0.0:$PORT (or 3000), serving ./public for other paths
//! geminichat-server
//!
//! # Pick the address, static directory and model explicitly
//! geminichat-server --addr 127.0.0.1:8080 --public-dir www --model gemini-2.0-flash
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info,geminichat=debug`).

use std::env;
use std::process::ExitCode;

use arrrg::CommandLine;
use tracing_subscriber::EnvFilter;

use geminichat::client::API_KEY_ENV;
use geminichat::{AppState, ChatBridge, Gemini, ServerArgs, ServerConfig};

const DEFAULT_LOG_FILTER: &str = "info,geminichat=debug";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let (args, _) = ServerArgs::from_command_line_relaxed("geminichat-server [OPTIONS]");
    let config = match ServerConfig::from_args(args) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let Some(api_key) = env::var(API_KEY_ENV).ok().filter(|key| !key.trim().is_empty()) else {
        tracing::error!("{API_KEY_ENV} is not set; refusing to start");
        return ExitCode::FAILURE;
    };

    let client = match Gemini::with_options(
        Some(api_key),
        config.base_url.clone(),
        Some(config.model.clone()),
    ) {
        Ok(client) => client,
        Err(err) => {
            tracing::error!(error = %err, "failed to create Gemini client");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(model = %client.model(), "using model");

    let state = AppState::new(ChatBridge::new(client));
    if let Err(err) = geminichat::serve(state, &config).await {
        tracing::error!(error = %err, "server exited");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
