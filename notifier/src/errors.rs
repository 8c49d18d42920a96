//! Error types for the deploy notifier

use thiserror::Error;

/// Main error type for the deploy notifier
#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Slack answered but rejected the call (`ok: false`)
    #[error("Slack API error: {0}")]
    SlackError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),
}
