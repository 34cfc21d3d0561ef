//! Authentication wire types and session/user models.

use serde::{Deserialize, Serialize};

/// Login request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// Refresh request body; an absent token serializes as `{}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Token pair returned by login, register and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokensResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub access_expires_at: String,
    #[serde(default)]
    pub refresh_expires_at: Option<String>,
}

/// The single live client session.
///
/// Expiry timestamps are kept exactly as the server sent them; an
/// unparsable value counts as expired.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub access_expires_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_expires_at: Option<String>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &redact(&self.access_token))
            .field("access_expires_at", &self.access_expires_at)
            .field("refresh_token", &self.refresh_token.as_deref().map(redact))
            .field("refresh_expires_at", &self.refresh_expires_at)
            .finish()
    }
}

/// First characters of a token, for logs.
pub(crate) fn redact(token: &str) -> String {
    let prefix: String = token.chars().take(8).collect();
    format!("{}…", prefix)
}

impl From<AuthTokensResponse> for Session {
    fn from(tokens: AuthTokensResponse) -> Self {
        // The server sends "" rather than omitting the refresh token.
        let refresh_token = tokens.refresh_token.filter(|t| !t.is_empty());
        let refresh_expires_at = tokens.refresh_expires_at.filter(|t| !t.is_empty());

        Self {
            access_token: tokens.access_token,
            access_expires_at: tokens.access_expires_at,
            refresh_token,
            refresh_expires_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

/// Profile of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub roles: Option<Vec<Role>>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl User {
    pub fn has_role(&self, name: &str) -> bool {
        self.roles
            .as_ref()
            .is_some_and(|roles| roles.iter().any(|r| r.name == name))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddPermissionRequest {
    pub permission_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignRoleRequest {
    pub role_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_refresh_request_without_token_is_empty_object() {
        let body = serde_json::to_value(RefreshRequest::default()).unwrap();
        assert_eq!(body, json!({}));

        let body = serde_json::to_value(RefreshRequest {
            refresh_token: Some("r1".to_string()),
        })
        .unwrap();
        assert_eq!(body, json!({"refresh_token": "r1"}));
    }

    #[test]
    fn test_session_from_tokens_drops_empty_refresh_token() {
        let tokens: AuthTokensResponse = serde_json::from_value(json!({
            "access_token": "A",
            "refresh_token": "",
            "access_expires_at": "2030-01-01T00:00:00Z",
            "refresh_expires_at": ""
        }))
        .unwrap();

        let session = Session::from(tokens);
        assert_eq!(session.access_token, "A");
        assert!(session.refresh_token.is_none());
        assert!(session.refresh_expires_at.is_none());
    }

    #[test]
    fn test_session_debug_redacts_tokens() {
        let session = Session {
            access_token: "eyJhbGciOiJIUzI1NiJ9.secret".to_string(),
            access_expires_at: "2030-01-01T00:00:00Z".to_string(),
            refresh_token: None,
            refresh_expires_at: None,
        };
        let debug = format!("{:?}", session);
        assert!(debug.contains("eyJhbGci…"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_user_roles() {
        let user: User = serde_json::from_value(json!({
            "id": "u-1",
            "email": "ada@example.com",
            "full_name": "Ada Lovelace",
            "roles": [{"id": 1, "name": "admin"}]
        }))
        .unwrap();

        assert!(user.has_role("admin"));
        assert!(!user.has_role("editor"));
        assert!(user.created_at.is_none());
    }
}
