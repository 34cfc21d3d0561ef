//! Console API client
//!
//! Session-aware client for the backoffice/frontoffice REST API.
//!
//! This crate provides:
//! - Session lifecycle (login, register, proactive and reactive refresh, logout)
//! - Token persistence behind a key-value store (memory, file, cookie jar)
//! - Envelope-unwrapping HTTP client with bearer authorization
//! - Profile, permission and CMS services
//! - Error normalization and remote error reporting

pub mod api;
pub mod app_session;
pub mod auth;
pub mod config;
pub mod error;
pub mod errors;
pub mod menu;
pub mod result_ext;
pub mod services;

pub use api::{ApiClient, TokenProvider};
pub use app_session::{GuardOutcome, SessionService};
pub use auth::{Session, SessionManager, SessionStore};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use errors::{ErrorReporter, NormalizedError};
pub use result_ext::{OptionResultExt, ResultExt};
