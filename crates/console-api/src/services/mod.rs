//! Typed wrappers over the REST endpoints.

pub mod cms;
pub mod permissions;
pub mod profile;

pub use cms::{
    CmsPublicService, CmsService, CreateDraftPageRequest, Page, PageBlock, PageColumn, PageDetail,
    PageRow, PageStatus, UpdatePageMetadataRequest,
};
pub use permissions::PermissionsService;
pub use profile::ProfileService;

/// Percent-encode one path segment.
pub(crate) fn escape_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
