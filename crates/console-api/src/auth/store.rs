//! Session persistence.
//!
//! The session is persisted as a single structured record behind the
//! [`SessionStore`] trait. Reads never fail: missing or malformed data loads
//! as an empty record.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use super::models::Session;
use crate::error::ClientResult;

/// Persisted view of the session. Every field is optional because the
/// access half is cleared on logout while the refresh half stays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_expires_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_expires_at: Option<String>,
}

impl PersistedSession {
    /// Write a session over this record. Refresh fields are only replaced
    /// when the session carries a refresh token.
    pub fn apply(&mut self, session: &Session) {
        self.access_token = Some(session.access_token.clone());
        self.access_expires_at = Some(session.access_expires_at.clone());

        if let Some(ref refresh_token) = session.refresh_token {
            self.refresh_token = Some(refresh_token.clone());
            self.refresh_expires_at = session.refresh_expires_at.clone();
        }
    }

    /// Drop the access half; the refresh token survives.
    pub fn clear_access(&mut self) {
        self.access_token = None;
        self.access_expires_at = None;
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Treat empty strings as absent.
    fn normalized(mut self) -> Self {
        for field in [
            &mut self.access_token,
            &mut self.access_expires_at,
            &mut self.refresh_token,
            &mut self.refresh_expires_at,
        ] {
            if field.as_deref().is_some_and(str::is_empty) {
                *field = None;
            }
        }
        self
    }
}

/// Key-value storage of the session record.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the persisted record; absence and corruption both yield an
    /// empty record.
    async fn load(&self) -> PersistedSession;

    /// Persist a freshly obtained session.
    async fn save(&self, session: &Session) -> ClientResult<()>;

    /// Remove the access token and its expiry.
    async fn clear(&self) -> ClientResult<()>;

    async fn access_token(&self) -> Option<String> {
        self.load().await.access_token
    }

    async fn refresh_token(&self) -> Option<String> {
        self.load().await.refresh_token
    }
}

/// In-process store, for tests and short-lived processes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: RwLock<PersistedSession>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: PersistedSession) -> Self {
        Self {
            record: RwLock::new(record),
        }
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self) -> PersistedSession {
        self.record.read().await.clone().normalized()
    }

    async fn save(&self, session: &Session) -> ClientResult<()> {
        self.record.write().await.apply(session);
        Ok(())
    }

    async fn clear(&self) -> ClientResult<()> {
        self.record.write().await.clear_access();
        Ok(())
    }
}

/// Store keeping the record as one JSON file.
///
/// Writes go to a sibling temp file which is then renamed over the target.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(&self, record: &PersistedSession) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let data = serde_json::to_vec_pretty(record)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!(path = %self.path.display(), "Session record written");
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileStore {
    async fn load(&self) -> PersistedSession {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return PersistedSession::default();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read session record");
                return PersistedSession::default();
            }
        };

        match serde_json::from_slice::<PersistedSession>(&data) {
            Ok(record) => record.normalized(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring malformed session record");
                PersistedSession::default()
            }
        }
    }

    async fn save(&self, session: &Session) -> ClientResult<()> {
        let mut record = self.load().await;
        record.apply(session);
        self.write(&record).await
    }

    async fn clear(&self) -> ClientResult<()> {
        let mut record = self.load().await;
        if record.access_token.is_none() && record.access_expires_at.is_none() {
            return Ok(());
        }
        record.clear_access();
        self.write(&record).await
    }
}
