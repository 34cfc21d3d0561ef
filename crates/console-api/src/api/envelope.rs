//! Response envelopes shared by every endpoint.

use serde::{Deserialize, Serialize};

/// Standard success wrapper: `{"data": T}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// Standard error wrapper: `{"error": {"code", "message", "details"}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiErrorBody {
    /// Extract an API error from an arbitrary response body.
    ///
    /// Only objects carrying both `error.code` and `error.message` as strings
    /// qualify.
    pub fn from_body(body: &serde_json::Value) -> Option<Self> {
        let error = body.get("error")?;
        if !error.is_object() || !error["code"].is_string() || !error["message"].is_string() {
            return None;
        }
        serde_json::from_value(body.clone()).ok()
    }
}
