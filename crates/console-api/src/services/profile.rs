//! Current user's profile and menu.

use crate::api::{join_url, ApiClient};
use crate::auth::User;
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::menu::MenuItem;

#[derive(Debug, Clone)]
pub struct ProfileService {
    api: ApiClient,
    base_url: String,
}

impl ProfileService {
    pub fn new(api: ApiClient, base_url: impl Into<String>) -> Self {
        Self {
            api,
            base_url: base_url.into(),
        }
    }

    pub fn from_config(api: ApiClient, config: &ClientConfig) -> Self {
        Self::new(api, config.auth_base_url())
    }

    /// `GET /me`
    pub async fn me(&self) -> ClientResult<User> {
        self.api.get(&join_url(&self.base_url, "/me")).await
    }

    /// `GET /backoffice/me/menu`
    pub async fn my_menu(&self) -> ClientResult<Vec<MenuItem>> {
        self.api
            .get(&join_url(&self.base_url, "/backoffice/me/menu"))
            .await
    }
}
