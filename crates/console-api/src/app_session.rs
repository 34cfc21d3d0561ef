//! Backoffice session shell.
//!
//! Holds what the backoffice needs once a session exists: the signed-in
//! user and their menu. Also decides whether navigation to a protected
//! location is allowed.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::auth::{SessionManager, User};
use crate::config::ClientConfig;
use crate::menu::{sort_tree, MenuItem};
use crate::result_ext::ResultExt;
use crate::services::ProfileService;

/// Result of checking access to a protected location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Allow,
    Redirect { to: String, return_url: String },
}

impl GuardOutcome {
    /// Redirect target with the requested location as `returnUrl`.
    pub fn location(&self) -> Option<String> {
        match self {
            GuardOutcome::Allow => None,
            GuardOutcome::Redirect { to, return_url } => {
                let query: String = url::form_urlencoded::Serializer::new(String::new())
                    .append_pair("returnUrl", return_url)
                    .finish();
                Some(format!("{}?{}", to, query))
            }
        }
    }
}

#[derive(Debug, Default)]
struct Snapshot {
    user: Option<User>,
    menu: Option<Vec<MenuItem>>,
}

#[derive(Debug)]
pub struct SessionService {
    session: SessionManager,
    profile: ProfileService,
    login_path: String,
    snapshot: RwLock<Snapshot>,
}

impl SessionService {
    pub fn new(session: SessionManager, profile: ProfileService, login_path: impl Into<String>) -> Self {
        Self {
            session,
            profile,
            login_path: login_path.into(),
            snapshot: RwLock::new(Snapshot::default()),
        }
    }

    /// Wire the shell from configuration; profile calls go through the
    /// session's token provider.
    pub fn from_config(session: SessionManager, config: &ClientConfig) -> Self {
        let api = session.authorize(&crate::api::ApiClient::from_config(config));
        let profile = ProfileService::from_config(api, config);
        Self::new(session, profile, config.login_path.clone())
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.snapshot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.snapshot.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load user and menu for the current session.
    ///
    /// Without a session there is nothing to load and this returns `true`.
    /// If either call fails the session is ended and this returns `false`.
    pub async fn initialize(&self) -> bool {
        if !self.session.is_authenticated() {
            tracing::debug!("No session, skipping profile load");
            return true;
        }

        let loaded = tokio::try_join!(self.profile.me(), self.profile.my_menu());
        match loaded.log("loading profile and menu") {
            Ok((user, mut menu)) => {
                sort_tree(&mut menu);
                tracing::info!(user = %user.email, menu_items = menu.len(), "Session initialized");

                let mut snapshot = self.write();
                snapshot.user = Some(user);
                snapshot.menu = Some(menu);
                true
            }
            Err(_) => {
                tracing::warn!("Profile unavailable, signing out");
                self.logout().await;
                false
            }
        }
    }

    pub fn user(&self) -> Option<User> {
        self.read().user.clone()
    }

    pub fn menu(&self) -> Option<Vec<MenuItem>> {
        self.read().menu.clone()
    }

    /// Both user and menu are loaded.
    pub fn is_ready(&self) -> bool {
        let snapshot = self.read();
        snapshot.user.is_some() && snapshot.menu.is_some()
    }

    pub async fn logout(&self) {
        self.session.logout().await;
        *self.write() = Snapshot::default();
    }

    /// Allow authenticated navigation; send everything else to the login
    /// page, remembering where it was headed.
    pub fn guard(&self, requested_url: &str) -> GuardOutcome {
        if self.session.is_authenticated() {
            GuardOutcome::Allow
        } else {
            GuardOutcome::Redirect {
                to: self.login_path.clone(),
                return_url: requested_url.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryStore;
    use std::sync::Arc;

    fn service() -> SessionService {
        let config = ClientConfig::with_base_url("http://127.0.0.1:9");
        let session = SessionManager::from_config(&config, Arc::new(MemoryStore::new()));
        SessionService::from_config(session, &config)
    }

    #[tokio::test]
    async fn test_initialize_without_session_is_noop() {
        let shell = service();
        assert!(shell.initialize().await);
        assert!(!shell.is_ready());
        assert!(shell.user().is_none());
    }

    #[test]
    fn test_guard_redirects_when_signed_out() {
        let shell = service();
        let outcome = shell.guard("/admin/cms/pages?page=2");

        assert_eq!(
            outcome,
            GuardOutcome::Redirect {
                to: "/admin/auth/login".to_string(),
                return_url: "/admin/cms/pages?page=2".to_string(),
            }
        );
        assert_eq!(
            outcome.location().as_deref(),
            Some("/admin/auth/login?returnUrl=%2Fadmin%2Fcms%2Fpages%3Fpage%3D2")
        );
        assert!(GuardOutcome::Allow.location().is_none());
    }
}
