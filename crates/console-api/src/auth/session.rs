//! Session lifecycle: login, refresh, logout and restore.
//!
//! [`SessionManager`] owns the single live [`Session`]. Every successful
//! login, register or refresh persists the tokens, publishes the new state on
//! a watch channel and arms the proactive refresh timer for
//! `expiry - refresh_buffer`. A timer-driven refresh that fails ends the
//! session.
//!
//! All transitions are serialized by one async gate. A refresh that had to
//! wait for another transition reuses the session that transition produced
//! instead of issuing a second request.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};

use super::expiry::is_expired;
use super::models::{AuthTokensResponse, LoginRequest, RefreshRequest, RegisterRequest, Session};
use super::scheduler::{plan_refresh, RefreshTimer};
use super::store::SessionStore;
use crate::api::{join_url, ApiClient, TokenProvider};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

struct Inner {
    api: ApiClient,
    auth_base_url: String,
    refresh_buffer: Duration,
    store: Arc<dyn SessionStore>,
    state: watch::Sender<Option<Session>>,
    timer: RefreshTimer,
    gate: Mutex<()>,
    generation: AtomicU64,
}

/// Handle to the client session. Cheap to clone.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("auth_base_url", &self.inner.auth_base_url)
            .field("session", &*self.inner.state.borrow())
            .field("timer", &self.inner.timer)
            .finish()
    }
}

impl SessionManager {
    /// Create a manager.
    ///
    /// `api` is used for the `/auth/*` calls and must not carry this
    /// manager as its token provider.
    pub fn new(config: &ClientConfig, api: ApiClient, store: Arc<dyn SessionStore>) -> Self {
        let (state, _) = watch::channel(None);

        Self {
            inner: Arc::new(Inner {
                api,
                auth_base_url: config.auth_base_url().to_string(),
                refresh_buffer: config.refresh_buffer(),
                store,
                state,
                timer: RefreshTimer::new(),
                gate: Mutex::new(()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn from_config(config: &ClientConfig, store: Arc<dyn SessionStore>) -> Self {
        Self::new(config, ApiClient::from_config(config), store)
    }

    /// Clone of `api` that authorizes its requests through this session.
    pub fn authorize(&self, api: &ApiClient) -> ApiClient {
        api.clone().with_token_provider(Arc::new(self.clone()))
    }

    pub fn session(&self) -> Option<Session> {
        self.inner.state.borrow().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner
            .state
            .borrow()
            .as_ref()
            .map(|session| session.access_token.clone())
    }

    /// True while a session with a non-expired access token is live.
    pub fn is_authenticated(&self) -> bool {
        self.inner
            .state
            .borrow()
            .as_ref()
            .is_some_and(|session| !is_expired(&session.access_expires_at))
    }

    /// Current session, or [`ClientError::NotAuthenticated`] when signed out
    /// or expired.
    pub fn require_session(&self) -> ClientResult<Session> {
        self.session()
            .filter(|session| !is_expired(&session.access_expires_at))
            .ok_or(ClientError::NotAuthenticated)
    }

    /// Watch session changes; `None` means signed out.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.inner.state.subscribe()
    }

    pub fn scheduled_refresh_at(&self) -> Option<DateTime<Utc>> {
        self.inner.timer.scheduled_at()
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.inner.store
    }

    fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    fn auth_url(&self, path: &str) -> String {
        join_url(&self.inner.auth_base_url, path)
    }

    /// Sign in with email and password.
    pub async fn login(&self, request: &LoginRequest) -> ClientResult<Session> {
        let _gate = self.inner.gate.lock().await;
        tracing::info!(email = %request.email, "Signing in");

        let tokens: AuthTokensResponse = self
            .inner
            .api
            .post(&self.auth_url("/auth/login"), request)
            .await?;
        Ok(self.establish(tokens).await)
    }

    /// Create an account; the response signs the new user in.
    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<Session> {
        let _gate = self.inner.gate.lock().await;
        tracing::info!(email = %request.email, "Registering account");

        let tokens: AuthTokensResponse = self
            .inner
            .api
            .post(&self.auth_url("/auth/register"), request)
            .await?;
        Ok(self.establish(tokens).await)
    }

    /// Exchange the stored refresh token for a new token pair.
    ///
    /// Errors are returned as-is; the current session is left untouched.
    pub async fn refresh(&self) -> ClientResult<Session> {
        let observed = self.generation();
        self.refresh_after(observed).await
    }

    /// End the session: cancel the timer, clear the stored access token
    /// and publish `None`. Never fails; storage errors are logged.
    pub async fn logout(&self) {
        let _gate = self.inner.gate.lock().await;
        self.clear().await;
        tracing::info!("Signed out");
    }

    /// Adopt a persisted, still valid access token.
    ///
    /// The restored session carries no refresh token; the proactive refresh
    /// reads it from the store when it runs.
    pub async fn restore(&self) -> Option<Session> {
        let _gate = self.inner.gate.lock().await;
        let record = self.inner.store.load().await;

        match (record.access_token, record.access_expires_at) {
            (Some(access_token), Some(access_expires_at)) if !is_expired(&access_expires_at) => {
                let session = Session {
                    access_token,
                    access_expires_at,
                    refresh_token: None,
                    refresh_expires_at: None,
                };
                tracing::info!(expires_at = %session.access_expires_at, "Restored persisted session");
                Some(self.adopt(session))
            }
            _ => {
                tracing::debug!("No valid persisted session");
                self.clear().await;
                None
            }
        }
    }

    async fn refresh_after(&self, observed: u64) -> ClientResult<Session> {
        let _gate = self.inner.gate.lock().await;

        if self.generation() != observed {
            if let Some(session) = self.session() {
                tracing::debug!("Session changed while waiting, reusing it");
                return Ok(session);
            }
        }

        self.request_refresh().await
    }

    async fn request_refresh(&self) -> ClientResult<Session> {
        let refresh_token = self.inner.store.refresh_token().await;
        tracing::debug!(has_refresh_token = refresh_token.is_some(), "Refreshing session");

        let tokens: AuthTokensResponse = self
            .inner
            .api
            .post(&self.auth_url("/auth/refresh"), &RefreshRequest { refresh_token })
            .await?;
        Ok(self.establish(tokens).await)
    }

    async fn establish(&self, tokens: AuthTokensResponse) -> Session {
        let session = Session::from(tokens);

        if let Err(e) = self.inner.store.save(&session).await {
            tracing::warn!(error = %e, "Failed to persist session");
        }

        tracing::info!(expires_at = %session.access_expires_at, "Session established");
        self.adopt(session)
    }

    fn adopt(&self, session: Session) -> Session {
        let generation = self.publish(Some(session.clone()));
        self.schedule(&session.access_expires_at, generation);
        session
    }

    fn publish(&self, session: Option<Session>) -> u64 {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.state.send_replace(session);
        generation
    }

    async fn clear(&self) {
        self.inner.timer.cancel();

        if let Err(e) = self.inner.store.clear().await {
            tracing::warn!(error = %e, "Failed to clear stored session");
        }

        self.publish(None);
    }

    fn schedule(&self, expires_at: &str, generation: u64) {
        let plan = plan_refresh(expires_at, self.inner.refresh_buffer, Utc::now());
        let weak = Arc::downgrade(&self.inner);

        self.inner.timer.arm(plan, move |timer_id| async move {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.timer.release(timer_id);
            SessionManager { inner }.run_scheduled_refresh(generation).await;
        });
    }

    async fn run_scheduled_refresh(&self, generation: u64) {
        let _gate = self.inner.gate.lock().await;

        if self.generation() != generation {
            tracing::debug!("Session changed since refresh was scheduled, skipping");
            return;
        }

        if let Err(e) = self.request_refresh().await {
            tracing::warn!(error = %e, "Scheduled refresh failed, signing out");
            self.clear().await;
        }
    }
}

#[async_trait]
impl TokenProvider for SessionManager {
    async fn access_token(&self) -> Option<String> {
        SessionManager::access_token(self)
    }

    async fn refresh_access_token(&self, rejected: Option<&str>) -> Option<String> {
        let observed = self.generation();

        if let Some(current) = SessionManager::access_token(self) {
            if rejected != Some(current.as_str()) {
                tracing::debug!("Rejected token already replaced, retrying with current one");
                return Some(current);
            }
        }

        match self.refresh_after(observed).await {
            Ok(session) => Some(session.access_token),
            Err(e) => {
                tracing::warn!(error = %e, "Session refresh after 401 failed, signing out");
                self.logout().await;
                None
            }
        }
    }
}
