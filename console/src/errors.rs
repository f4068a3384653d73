//! Error types for the Genie console

use thiserror::Error;

use crate::authn::permissions::Capability;

/// Main error type for the Genie console
#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Error reported by the backend, either through a non-2xx status or an
    /// `error` field in an otherwise successful response.
    #[error("{message}")]
    Backend { status: Option<u16>, message: String },

    /// A state-transition request the backend did not acknowledge.
    #[error("{0}")]
    ActionFailed(String),

    #[error("No data available to export")]
    EmptyExport,

    #[error("Permission denied: {0}")]
    Forbidden(Capability),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Realtime error: {0}")]
    RealtimeError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConsoleError {
    /// Message suitable for a transient user notification
    pub fn user_message(&self) -> String {
        match self {
            ConsoleError::HttpError(e) if e.is_timeout() => {
                "The server took too long to respond".to_string()
            }
            ConsoleError::HttpError(e) if e.is_connect() => {
                "Unable to reach the server".to_string()
            }
            other => other.to_string(),
        }
    }
}
