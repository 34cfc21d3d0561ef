//! Browser-compatible cookie rendition of the session.
//!
//! One cookie per field (`access_token`, `access_expires_at`,
//! `refresh_token`), values percent-encoded, each with its own expiry.
//! [`CookieJar`] keeps the jar in memory and queues the `Set-Cookie`
//! headers a caller has to forward.

use async_trait::async_trait;
use cookie::Cookie;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use time::OffsetDateTime;

use super::expiry::parse_timestamp;
use super::models::Session;
use super::store::{PersistedSession, SessionStore};
use crate::error::ClientResult;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const ACCESS_EXPIRES_AT_COOKIE: &str = "access_expires_at";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Lax,
    Strict,
    None,
}

impl From<SameSite> for cookie::SameSite {
    fn from(value: SameSite) -> Self {
        match value {
            SameSite::Lax => cookie::SameSite::Lax,
            SameSite::Strict => cookie::SameSite::Strict,
            SameSite::None => cookie::SameSite::None,
        }
    }
}

/// Attributes applied to every session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: String,
    pub domain: Option<String>,
    pub same_site: Option<SameSite>,
    pub secure: bool,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            domain: None,
            same_site: Some(SameSite::Lax),
            secure: false,
        }
    }
}

fn to_offset_datetime(expires_at: &str) -> Option<OffsetDateTime> {
    let parsed = parse_timestamp(expires_at)?;
    OffsetDateTime::from_unix_timestamp(parsed.timestamp()).ok()
}

/// Build a cookie; `Expires` is only set when `expires_at` parses.
pub fn build_cookie(
    name: &str,
    value: &str,
    expires_at: Option<&str>,
    options: &CookieOptions,
) -> Cookie<'static> {
    let mut builder = Cookie::build((name.to_string(), value.to_string()))
        .path(options.path.clone())
        .secure(options.secure);

    if let Some(ref domain) = options.domain {
        builder = builder.domain(domain.clone());
    }

    if let Some(same_site) = options.same_site {
        builder = builder.same_site(same_site.into());
    }

    if let Some(expires) = expires_at.and_then(to_offset_datetime) {
        builder = builder.expires(expires);
    }

    builder.build()
}

/// Render a `Set-Cookie` header value.
pub fn set_cookie_header(
    name: &str,
    value: &str,
    expires_at: Option<&str>,
    options: &CookieOptions,
) -> String {
    build_cookie(name, value, expires_at, options)
        .encoded()
        .to_string()
}

/// Render a `Set-Cookie` header that deletes the cookie.
pub fn clear_cookie_header(name: &str, options: &CookieOptions) -> String {
    let mut cookie = build_cookie(name, "", None, options);
    cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
    cookie.encoded().to_string()
}

/// Look a cookie up in a `Cookie` request header.
///
/// Missing names and malformed pairs yield `None`; values are
/// percent-decoded.
pub fn parse_cookie_header(header: &str, name: &str) -> Option<String> {
    Cookie::split_parse_encoded(header)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
}

#[derive(Debug, Default)]
struct JarState {
    values: BTreeMap<String, String>,
    pending: Vec<String>,
}

/// In-memory cookie jar implementing [`SessionStore`].
#[derive(Debug, Default)]
pub struct CookieJar {
    options: CookieOptions,
    state: Mutex<JarState>,
}

impl CookieJar {
    pub fn new(options: CookieOptions) -> Self {
        Self {
            options,
            state: Mutex::new(JarState::default()),
        }
    }

    /// Seed the jar from a browser `Cookie` header.
    pub fn from_cookie_header(options: CookieOptions, header: &str) -> Self {
        let mut values = BTreeMap::new();
        for name in [ACCESS_TOKEN_COOKIE, ACCESS_EXPIRES_AT_COOKIE, REFRESH_TOKEN_COOKIE] {
            if let Some(value) = parse_cookie_header(header, name) {
                values.insert(name.to_string(), value);
            }
        }

        Self {
            options,
            state: Mutex::new(JarState {
                values,
                pending: Vec::new(),
            }),
        }
    }

    pub fn options(&self) -> &CookieOptions {
        &self.options
    }

    fn lock(&self) -> MutexGuard<'_, JarState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current value of a cookie; empty values count as absent.
    pub fn get(&self, name: &str) -> Option<String> {
        self.lock()
            .values
            .get(name)
            .filter(|value| !value.is_empty())
            .cloned()
    }

    /// Render the jar as a `Cookie` request header.
    pub fn cookie_header(&self) -> String {
        self.lock()
            .values
            .iter()
            .map(|(name, value)| {
                Cookie::new(name.clone(), value.clone())
                    .encoded()
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Drain the `Set-Cookie` headers produced since the last call.
    pub fn take_set_cookie_headers(&self) -> Vec<String> {
        std::mem::take(&mut self.lock().pending)
    }

    fn set(&self, state: &mut JarState, name: &str, value: &str, expires_at: Option<&str>) {
        state
            .pending
            .push(set_cookie_header(name, value, expires_at, &self.options));
        state.values.insert(name.to_string(), value.to_string());
    }

    fn remove(&self, state: &mut JarState, name: &str) {
        state.pending.push(clear_cookie_header(name, &self.options));
        state.values.remove(name);
    }
}

#[async_trait]
impl SessionStore for CookieJar {
    async fn load(&self) -> PersistedSession {
        PersistedSession {
            access_token: self.get(ACCESS_TOKEN_COOKIE),
            access_expires_at: self.get(ACCESS_EXPIRES_AT_COOKIE),
            refresh_token: self.get(REFRESH_TOKEN_COOKIE),
            refresh_expires_at: None,
        }
    }

    async fn save(&self, session: &Session) -> ClientResult<()> {
        let mut state = self.lock();
        let expires = Some(session.access_expires_at.as_str());
        self.set(&mut state, ACCESS_TOKEN_COOKIE, &session.access_token, expires);
        self.set(&mut state, ACCESS_EXPIRES_AT_COOKIE, &session.access_expires_at, expires);

        if let Some(ref refresh_token) = session.refresh_token {
            self.set(
                &mut state,
                REFRESH_TOKEN_COOKIE,
                refresh_token,
                session.refresh_expires_at.as_deref(),
            );
        }
        Ok(())
    }

    async fn clear(&self) -> ClientResult<()> {
        let mut state = self.lock();
        self.remove(&mut state, ACCESS_TOKEN_COOKIE);
        self.remove(&mut state, ACCESS_EXPIRES_AT_COOKIE);
        Ok(())
    }
}
