//! Envelope-unwrapping HTTP client for the REST API.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use super::envelope::ApiResponse;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Source of bearer credentials for authorized requests.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current access token, if a session is live.
    async fn access_token(&self) -> Option<String>;

    /// Obtain a usable access token after the server rejected `rejected`.
    ///
    /// Returns `None` when the session could not be refreshed.
    async fn refresh_access_token(&self, rejected: Option<&str>) -> Option<String>;
}

/// HTTP client for the REST API.
///
/// Every response is expected as `{"data": T}` and is unwrapped before it is
/// returned. Endpoints may be relative (joined to the base URL) or absolute.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    tokens: Option<Arc<dyn TokenProvider>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authorized", &self.tokens.is_some())
            .finish()
    }
}

impl ApiClient {
    /// Create a new API client.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    /// Attach a token provider; requests then carry `Authorization: Bearer`.
    pub fn with_token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.tokens = Some(provider);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_authorized(&self) -> bool {
        self.tokens.is_some()
    }

    /// Build the full URL from the base URL and an endpoint.
    pub fn build_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return endpoint.to_string();
        }

        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    /// GET and unwrap the envelope.
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> ClientResult<T> {
        let body = self.execute(Method::GET, endpoint, None).await?;
        unwrap_envelope(body)
    }

    /// POST a JSON body and unwrap the envelope.
    pub async fn post<T, B>(&self, endpoint: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let payload = serde_json::to_value(body)?;
        let body = self.execute(Method::POST, endpoint, Some(&payload)).await?;
        unwrap_envelope(body)
    }

    /// PUT a JSON body and unwrap the envelope.
    pub async fn put<T, B>(&self, endpoint: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let payload = serde_json::to_value(body)?;
        let body = self.execute(Method::PUT, endpoint, Some(&payload)).await?;
        unwrap_envelope(body)
    }

    /// PATCH a JSON body and unwrap the envelope.
    pub async fn patch<T, B>(&self, endpoint: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let payload = serde_json::to_value(body)?;
        let body = self.execute(Method::PATCH, endpoint, Some(&payload)).await?;
        unwrap_envelope(body)
    }

    /// DELETE and unwrap the envelope.
    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> ClientResult<T> {
        let body = self.execute(Method::DELETE, endpoint, None).await?;
        unwrap_envelope(body)
    }

    /// Send a request, retrying once with a refreshed token on 401.
    async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&serde_json::Value>,
    ) -> ClientResult<serde_json::Value> {
        let url = self.build_url(endpoint);

        let token = match &self.tokens {
            Some(provider) => provider.access_token().await,
            None => None,
        };

        let mut response = self
            .send_once(method.clone(), &url, body, token.as_deref())
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            if let Some(provider) = &self.tokens {
                tracing::debug!(url = %url, "Request unauthorized, refreshing session");
                if let Some(fresh) = provider.refresh_access_token(token.as_deref()).await {
                    response = self.send_once(method, &url, body, Some(&fresh)).await?;
                }
            }
        }

        read_body(&url, response).await
    }

    async fn send_once(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
        token: Option<&str>,
    ) -> ClientResult<reqwest::Response> {
        let mut request = self.client.request(method.clone(), url);

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::trace!(method = %method, url = %url, "Sending request");
        Ok(request.send().await?)
    }
}

/// Read a response body as JSON, turning non-success statuses into errors.
async fn read_body(url: &str, response: reqwest::Response) -> ClientResult<serde_json::Value> {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    if !status.is_success() {
        let body = if text.is_empty() {
            None
        } else {
            Some(
                serde_json::from_str(&text)
                    .unwrap_or_else(|_| serde_json::Value::String(text.clone())),
            )
        };

        tracing::debug!(url = %url, status = status.as_u16(), "Request failed");

        return Err(ClientError::Http {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            url: url.to_string(),
            body,
        });
    }

    if text.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }

    Ok(serde_json::from_str(&text)?)
}

fn unwrap_envelope<T: DeserializeOwned>(body: serde_json::Value) -> ClientResult<T> {
    // Empty bodies only satisfy payloads that accept null.
    if body.is_null() {
        return Ok(serde_json::from_value(body)?);
    }
    let envelope: ApiResponse<T> = serde_json::from_value(body)?;
    Ok(envelope.data)
}

/// Join a service base URL and a path the way the services expect.
///
/// An empty base keeps the path relative so the client's base URL applies.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}{}", base, path)
    }
}
