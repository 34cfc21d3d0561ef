//! Error handling pipeline: normalize, log and report remotely.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinHandle;

use super::normalize::{normalize, normalize_message, NormalizedError};
use crate::api::{join_url, ApiClient};
use crate::config::ClientConfig;
use crate::error::ClientError;

/// Body of `POST /logs/errors`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogErrorRequest {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Logs normalized errors and submits them to the logging API when one is
/// configured. Submission is best-effort and never surfaces its own errors.
#[derive(Debug, Clone)]
pub struct ErrorReporter {
    api: ApiClient,
    logging_url: Option<String>,
    user_agent: String,
    context_url: Option<String>,
}

impl ErrorReporter {
    pub fn new(api: ApiClient, logging_url: Option<String>) -> Self {
        Self {
            api,
            logging_url: logging_url.filter(|url| !url.is_empty()),
            user_agent: format!("console-api/{}", env!("CARGO_PKG_VERSION")),
            context_url: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(ApiClient::from_config(config), config.error_logging_url.clone())
    }

    /// Location reported with every error (the page or command in use).
    pub fn with_context_url(mut self, url: impl Into<String>) -> Self {
        self.context_url = Some(url.into());
        self
    }

    pub fn is_remote_enabled(&self) -> bool {
        self.logging_url.is_some()
    }

    /// Normalize, log and submit a client error.
    pub fn handle(&self, err: &ClientError) -> NormalizedError {
        let normalized = normalize(err);
        self.report(&normalized);
        normalized
    }

    /// Same as [`handle`](Self::handle) for a free-form message.
    pub fn handle_message(&self, message: impl Into<String>) -> NormalizedError {
        let normalized = normalize_message(message);
        self.report(&normalized);
        normalized
    }

    /// Log at error level and submit in the background.
    pub fn report(&self, error: &NormalizedError) -> Option<JoinHandle<()>> {
        tracing::error!(
            code = %error.code,
            message = %error.message,
            details = ?error.details,
            "Request failed"
        );
        self.submit(error)
    }

    pub fn log_request(&self, error: &NormalizedError) -> LogErrorRequest {
        LogErrorRequest {
            code: error.code.clone(),
            message: error.message.clone(),
            details: error.details.clone(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            user_agent: Some(self.user_agent.clone()),
            url: self.context_url.clone(),
        }
    }

    /// Submit to `{logging_url}/logs/errors` on a background task.
    ///
    /// Returns `None` when no logging URL is configured or no runtime is
    /// available.
    pub fn submit(&self, error: &NormalizedError) -> Option<JoinHandle<()>> {
        let Some(ref logging_url) = self.logging_url else {
            tracing::debug!("Error logging URL not configured, skipping remote submission");
            return None;
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No async runtime, skipping remote error submission");
            return None;
        };

        let request = self.log_request(error);
        let url = join_url(logging_url, "/logs/errors");
        let api = self.api.clone();

        Some(runtime.spawn(async move {
            if let Err(e) = api.post::<Option<Value>, _>(&url, &request).await {
                // Never report a failed report.
                tracing::debug!(error = %e, "Failed to submit error report");
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn api() -> ApiClient {
        ApiClient::new("http://127.0.0.1:9", Duration::from_secs(1))
    }

    #[test]
    fn test_no_logging_url_skips_submission() {
        let reporter = ErrorReporter::new(api(), Some(String::new()));
        assert!(!reporter.is_remote_enabled());

        let normalized = reporter.handle(&ClientError::NotAuthenticated);
        assert_eq!(normalized.code, "CLIENT_ERROR");
        assert!(reporter.submit(&normalized).is_none());
    }

    #[test]
    fn test_log_request_shape() {
        let reporter = ErrorReporter::new(api(), None).with_context_url("/admin/cms/pages");
        let request = reporter.log_request(&normalize_message("odd"));

        assert_eq!(request.code, "UNKNOWN_ERROR");
        assert_eq!(request.url.as_deref(), Some("/admin/cms/pages"));
        assert!(request.user_agent.unwrap().starts_with("console-api/"));
        assert!(crate::auth::parse_timestamp(&request.timestamp).is_some());

        let body = serde_json::to_value(reporter.log_request(&normalize_message("odd"))).unwrap();
        assert!(body.get("details").is_none());
        assert!(body.get("user_agent").is_some());
    }

    #[tokio::test]
    async fn test_failed_submission_is_swallowed() {
        let reporter = ErrorReporter::new(api(), Some("http://127.0.0.1:9".to_string()));
        let normalized = reporter.handle_message("boom");
        assert_eq!(normalized.code, "UNKNOWN_ERROR");

        let handle = reporter.submit(&normalized).expect("submission spawned");
        assert!(handle.await.is_ok());
    }
}
