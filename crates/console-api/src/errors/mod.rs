//! Error normalization and reporting.
//!
//! Every [`ClientError`](crate::ClientError) maps to a [`NormalizedError`]
//! with a stable code: API error codes pass through, HTTP failures become
//! `HTTP_<status>`, other client failures `CLIENT_ERROR` and free-form
//! messages `UNKNOWN_ERROR`.

mod normalize;
mod reporter;

pub use normalize::{
    format_for_user, http_error_message, normalize, normalize_message, NormalizedError,
    CLIENT_ERROR, UNKNOWN_ERROR,
};
pub use reporter::{ErrorReporter, LogErrorRequest};
