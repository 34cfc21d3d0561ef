//! Error types for the console API client.
//!
//! Every fallible operation in this crate returns [`ClientError`]. The
//! [`crate::errors`] module turns these into the normalized
//! `{code, message, details}` shape shown to users.

use thiserror::Error;

/// Client-level errors.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server answered with a non-success status
    #[error("HTTP {status} {status_text} from {url}")]
    Http {
        status: u16,
        status_text: String,
        url: String,
        body: Option<serde_json::Value>,
    },

    /// The request never produced a response (connect, timeout, TLS, ...)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Session persistence failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// An authenticated call was attempted without a session
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// HTTP status of the failure, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

/// Result type alias using ClientError.
pub type ClientResult<T> = Result<T, ClientError>;

impl From<envy::Error> for ClientError {
    fn from(err: envy::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}
