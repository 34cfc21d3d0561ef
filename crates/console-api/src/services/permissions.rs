//! Role and permission administration.

use serde_json::Value;

use super::escape_segment;
use crate::api::{join_url, ApiClient};
use crate::auth::{AddPermissionRequest, AssignRoleRequest, CreateRoleRequest, Role};
use crate::config::ClientConfig;
use crate::error::ClientResult;

#[derive(Debug, Clone)]
pub struct PermissionsService {
    api: ApiClient,
    base_url: String,
}

impl PermissionsService {
    pub fn new(api: ApiClient, base_url: impl Into<String>) -> Self {
        Self {
            api,
            base_url: base_url.into(),
        }
    }

    pub fn from_config(api: ApiClient, config: &ClientConfig) -> Self {
        Self::new(api, config.authz_base_url())
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    pub async fn roles(&self) -> ClientResult<Vec<Role>> {
        self.api.get(&self.url("/backoffice/roles")).await
    }

    pub async fn create_role(&self, request: &CreateRoleRequest) -> ClientResult<Role> {
        tracing::info!(name = %request.name, "Creating role");
        self.api.post(&self.url("/backoffice/roles"), request).await
    }

    pub async fn add_permission_to_role(
        &self,
        role_id: i64,
        request: &AddPermissionRequest,
    ) -> ClientResult<Option<Value>> {
        tracing::info!(role_id, permission_id = %request.permission_id, "Adding permission to role");
        self.api
            .post(&self.url(&format!("/backoffice/roles/{}/permissions", role_id)), request)
            .await
    }

    pub async fn assign_role_to_user(
        &self,
        user_id: &str,
        request: &AssignRoleRequest,
    ) -> ClientResult<Option<Value>> {
        tracing::info!(user_id, role_id = request.role_id, "Assigning role to user");
        self.api
            .post(
                &self.url(&format!("/backoffice/users/{}/roles", escape_segment(user_id))),
                request,
            )
            .await
    }
}
