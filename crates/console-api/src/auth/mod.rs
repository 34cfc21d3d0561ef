//! Authentication: wire models, token persistence and the session lifecycle.

pub mod cookie;
pub mod expiry;
pub mod models;
pub mod scheduler;
pub mod session;
pub mod store;

pub use cookie::{CookieJar, CookieOptions, SameSite};
pub use expiry::{is_expired, parse_timestamp};
pub use models::{
    AddPermissionRequest, AssignRoleRequest, AuthTokensResponse, CreateRoleRequest, LoginRequest,
    RefreshRequest, RegisterRequest, Role, Session, User,
};
pub use scheduler::{plan_refresh, RefreshPlan, RefreshTimer};
pub use session::SessionManager;
pub use store::{FileStore, MemoryStore, PersistedSession, SessionStore};
