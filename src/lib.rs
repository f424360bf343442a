//! Spotify Chat Relay Library
//!
//! This library implements a small backend relay in front of the Spotify Web
//! API and a hosted language-model chat endpoint. It handles the OAuth 2.0
//! authorization-code flow with signed, stateless `state` tokens, proxies a
//! handful of read-only Spotify calls with transparent token refresh, and
//! forwards a compacted listening-data snapshot together with a user question
//! to an OpenAI-compatible chat-completions endpoint.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for every exposed route
//! - `config` - Configuration management and environment variables
//! - `error` - Application error type and its HTTP mapping
//! - `llm` - Chat-completions client
//! - `logging` - Tracing subscriber setup
//! - `management` - In-memory token storage
//! - `server` - Router construction and the HTTP server loop
//! - `snapshot` - Compaction and truncation of listening data
//! - `spotify` - Spotify Accounts and Web API client implementation
//! - `types` - Data structures and type definitions
//! - `utils` - OAuth state signing and small helpers
//!
//! # Example
//!
//! ```
//! use spotify_chat_relay::{config, server};
//!
//! #[tokio::main]
//! async fn main() -> spotify_chat_relay::Res<()> {
//!     config::load_env();
//!     let config = config::Config::from_env()?;
//!     server::start_api_server(config).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod management;
pub mod server;
pub mod snapshot;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Used at the binary boundary where errors of different kinds (configuration,
/// I/O, server) meet. Library code returns the typed errors from [`error`] and
/// [`config`] instead.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// Console output for the operator running the binary. Request-level
/// diagnostics go through `tracing` instead.
///
/// # Example
///
/// ```
/// info!("Listening on {}", addr);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Relay started");
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only meant for fatal startup failures such as an incomplete configuration.
/// The process terminates with exit code 1 right after printing.
///
/// # Example
///
/// ```
/// error!("Missing required environment variable: {}", var_name);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// # Example
///
/// ```
/// warning!("OAUTH_STATE_SECRET not set, using an ephemeral secret");
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
