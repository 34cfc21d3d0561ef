//! CMS pages: administrative and public access.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::escape_segment;
use crate::api::{join_url, ApiClient};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub seo_description: Option<String>,
    #[serde(default)]
    pub seo_keywords: Option<String>,
    pub status: PageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A page together with its layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDetail {
    #[serde(flatten)]
    pub page: Page,
    #[serde(default)]
    pub layout: Vec<PageRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRow {
    pub sort_order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css_class: Option<String>,
    #[serde(default)]
    pub columns: Vec<PageColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageColumn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width_md: Option<String>,
    #[serde(default)]
    pub blocks: Vec<PageBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub content: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDraftPageRequest {
    pub title: String,
}

/// Partial metadata update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePageMetadataRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

fn page_by_slug_url(base_url: &str, slug: &str) -> ClientResult<String> {
    if slug.trim().is_empty() {
        return Err(ClientError::InvalidRequest("page slug must not be empty".to_string()));
    }
    Ok(join_url(base_url, &format!("/pages/{}", escape_segment(slug))))
}

/// Administrative CMS endpoints.
#[derive(Debug, Clone)]
pub struct CmsService {
    api: ApiClient,
    base_url: String,
}

impl CmsService {
    pub fn new(api: ApiClient, base_url: impl Into<String>) -> Self {
        Self {
            api,
            base_url: base_url.into(),
        }
    }

    pub fn from_config(api: ApiClient, config: &ClientConfig) -> Self {
        Self::new(api, config.cms_base_url())
    }

    fn page_url(&self, id: Uuid, action: &str) -> String {
        join_url(&self.base_url, &format!("/pages/{}/{}", id, action))
    }

    pub async fn pages(&self) -> ClientResult<Vec<Page>> {
        self.api.get(&join_url(&self.base_url, "/pages")).await
    }

    pub async fn page_by_slug(&self, slug: &str) -> ClientResult<PageDetail> {
        self.api.get(&page_by_slug_url(&self.base_url, slug)?).await
    }

    pub async fn create_draft_page(&self, request: &CreateDraftPageRequest) -> ClientResult<Page> {
        tracing::info!(title = %request.title, "Creating draft page");
        self.api
            .post(&join_url(&self.base_url, "/pages"), request)
            .await
    }

    pub async fn update_page_metadata(
        &self,
        id: Uuid,
        request: &UpdatePageMetadataRequest,
    ) -> ClientResult<Option<Value>> {
        self.api.put(&self.page_url(id, "metadata"), request).await
    }

    pub async fn update_page_layout(&self, id: Uuid, layout: &[PageRow]) -> ClientResult<Option<Value>> {
        tracing::debug!(page_id = %id, rows = layout.len(), "Updating page layout");
        self.api.put(&self.page_url(id, "layout"), layout).await
    }

    pub async fn publish_page(&self, id: Uuid) -> ClientResult<Option<Value>> {
        tracing::info!(page_id = %id, "Publishing page");
        self.api
            .post(&self.page_url(id, "publish"), &serde_json::json!({}))
            .await
    }

    pub async fn archive_page(&self, id: Uuid) -> ClientResult<Option<Value>> {
        tracing::info!(page_id = %id, "Archiving page");
        self.api
            .post(&self.page_url(id, "archive"), &serde_json::json!({}))
            .await
    }
}

/// Read-only CMS access for public sites.
#[derive(Debug, Clone)]
pub struct CmsPublicService {
    api: ApiClient,
    base_url: String,
}

impl CmsPublicService {
    pub fn new(api: ApiClient, base_url: impl Into<String>) -> Self {
        Self {
            api,
            base_url: base_url.into(),
        }
    }

    pub fn from_config(api: ApiClient, config: &ClientConfig) -> Self {
        Self::new(api, config.cms_public_base_url())
    }

    /// Published page by slug.
    pub async fn page_by_slug(&self, slug: &str) -> ClientResult<PageDetail> {
        self.api.get(&page_by_slug_url(&self.base_url, slug)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_detail_deserialization() {
        let detail: PageDetail = serde_json::from_value(json!({
            "id": "6f1c2a1e-3b9d-4a57-9a43-0c8d1f2e7b10",
            "title": "About",
            "slug": "about",
            "seo_description": null,
            "seo_keywords": "company,team",
            "status": "published",
            "created_at": "2030-01-01T00:00:00Z",
            "updated_at": "2030-01-02T00:00:00Z",
            "layout": [{
                "sort_order": 0,
                "columns": [{
                    "width_md": "6",
                    "blocks": [{"type": "text", "content": {"html": "<p>Hi</p>"}}]
                }]
            }]
        }))
        .unwrap();

        assert_eq!(detail.page.status, PageStatus::Published);
        assert!(detail.page.seo_description.is_none());
        assert_eq!(detail.layout[0].columns[0].blocks[0].block_type, "text");
        assert_eq!(detail.layout[0].columns[0].blocks[0].content["html"], "<p>Hi</p>");
    }

    #[test]
    fn test_metadata_request_skips_unset_fields() {
        let body = serde_json::to_value(UpdatePageMetadataRequest {
            title: Some("New".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(body, json!({"title": "New"}));
    }

    #[test]
    fn test_slug_is_escaped() {
        assert_eq!(page_by_slug_url("http://cms", "a b/c").unwrap(), "http://cms/pages/a%20b%2Fc");
        assert_eq!(page_by_slug_url("", "about").unwrap(), "/pages/about");
        assert!(matches!(page_by_slug_url("", " "), Err(ClientError::InvalidRequest(_))));
    }
}
