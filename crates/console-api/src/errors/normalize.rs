//! Normalization of client errors into `{code, message, details}`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::ApiErrorBody;
use crate::error::ClientError;

pub const CLIENT_ERROR: &str = "CLIENT_ERROR";
pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";

const UNEXPECTED_ERROR_MESSAGE: &str =
    "An unexpected error occurred. Please try again or contact support.";

/// Error in the shape shown to users and submitted to the logging API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl NormalizedError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Status carried by an `HTTP_<status>` code.
    pub fn http_status(&self) -> Option<u16> {
        self.code.strip_prefix("HTTP_")?.parse().ok()
    }

    /// User-facing text; never includes the code.
    pub fn format_for_user(&self) -> String {
        format_for_user(self)
    }
}

impl std::fmt::Display for NormalizedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for NormalizedError {}

impl From<&ClientError> for NormalizedError {
    fn from(err: &ClientError) -> Self {
        normalize(err)
    }
}

impl From<ClientError> for NormalizedError {
    fn from(err: ClientError) -> Self {
        normalize(&err)
    }
}

/// Message for an HTTP status that carried no API error body.
pub fn http_error_message(status: u16, body: Option<&Value>) -> String {
    match status {
        0 => "Network error. Please check your internet connection.".to_string(),
        500..=u16::MAX => "Server error. Please try again later.".to_string(),
        404 => "The requested resource was not found.".to_string(),
        403 => "You do not have permission to access this resource.".to_string(),
        401 => "Authentication required. Please log in.".to_string(),
        400..=499 => body
            .and_then(|b| b.get("message"))
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or("Invalid request. Please check your input.")
            .to_string(),
        _ => "An error occurred while processing your request.".to_string(),
    }
}

fn http_error(status: u16, status_text: &str, url: Option<&str>, body: Option<&Value>) -> NormalizedError {
    if let Some(api_error) = body.and_then(ApiErrorBody::from_body) {
        let mut normalized = NormalizedError::new(api_error.error.code, api_error.error.message);
        normalized.details = api_error.error.details;
        return normalized;
    }

    NormalizedError::new(format!("HTTP_{}", status), http_error_message(status, body)).with_details(json!({
        "status": status,
        "status_text": status_text,
        "url": url,
        "body": body,
    }))
}

/// Normalize a client error.
pub fn normalize(err: &ClientError) -> NormalizedError {
    match err {
        ClientError::Http {
            status,
            status_text,
            url,
            body,
        } => http_error(*status, status_text, Some(url.as_str()), body.as_ref()),
        ClientError::Transport(e) => {
            let status = e.status().map(|s| s.as_u16()).unwrap_or(0);
            let status_text = e
                .status()
                .and_then(|s| s.canonical_reason())
                .unwrap_or_default();
            http_error(status, status_text, e.url().map(|u| u.as_str()), None)
        }
        other => NormalizedError::new(CLIENT_ERROR, other.to_string()).with_details(json!({
            "kind": client_error_kind(other),
        })),
    }
}

/// Normalize a free-form error message.
pub fn normalize_message(message: impl Into<String>) -> NormalizedError {
    NormalizedError::new(UNKNOWN_ERROR, message)
}

fn client_error_kind(err: &ClientError) -> &'static str {
    match err {
        ClientError::Http { .. } => "http",
        ClientError::Transport(_) => "transport",
        ClientError::Decode(_) => "decode",
        ClientError::Storage(_) => "storage",
        ClientError::Config(_) => "config",
        ClientError::NotAuthenticated => "not_authenticated",
        ClientError::InvalidRequest(_) => "invalid_request",
    }
}

pub fn format_for_user(err: &NormalizedError) -> String {
    if err.code == UNKNOWN_ERROR {
        UNEXPECTED_ERROR_MESSAGE.to_string()
    } else {
        err.message.clone()
    }
}
