//! REST API plumbing: response envelopes and the HTTP client.

mod client;
mod envelope;

pub use client::{ApiClient, TokenProvider};
pub(crate) use client::join_url;
pub use envelope::{ApiErrorBody, ApiErrorDetail, ApiResponse};
