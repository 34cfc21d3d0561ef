//! Logging helpers for client results.

use std::panic::Location;

use crate::error::ClientResult;
use crate::errors::NormalizedError;

/// Adds a `log` method to [`ClientResult`] that records the failure in its
/// normalized form before handing the result back unchanged.
pub trait ResultExt<T> {
    /// Log the error with context if this is an `Err` variant.
    ///
    /// ```ignore
    /// use console_api::ResultExt;
    ///
    /// let user = profile.me().await.log("loading profile")?;
    /// ```
    fn log(self, context: &str) -> ClientResult<T>;
}

impl<T> ResultExt<T> for ClientResult<T> {
    #[track_caller]
    fn log(self, context: &str) -> ClientResult<T> {
        if let Err(ref e) = self {
            let caller = Location::caller();
            let normalized = NormalizedError::from(e);
            tracing::error!(
                target: "console_api",
                code = %normalized.code,
                status = ?e.status(),
                error = %e,
                file = %format!("{}:{}", caller.file(), caller.line()),
                context,
                "{}",
                normalized.message
            );
        }
        self
    }
}

/// Warns when an expected value is missing.
pub trait OptionResultExt<T> {
    fn log_none(self, context: &str) -> Option<T>;
}

impl<T> OptionResultExt<T> for Option<T> {
    #[track_caller]
    fn log_none(self, context: &str) -> Option<T> {
        if self.is_none() {
            let caller = Location::caller();
            tracing::warn!(
                target: "console_api",
                file = %format!("{}:{}", caller.file(), caller.line()),
                context,
                "Expected value was None"
            );
        }
        self
    }
}
