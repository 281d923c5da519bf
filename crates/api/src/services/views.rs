//! Response views with materialized public URLs.

use pawtrait_core::images::{PublicUrls, TemplateImages};
use pawtrait_core::types::{DbId, Timestamp};
use pawtrait_db::models::prompt::Prompt;
use pawtrait_db::models::template::Template;
use pawtrait_storage::ObjectStorage;
use serde::Serialize;

/// URLs for every size and format of `images`. Legacy single-path entries
/// yield a JPEG URL and an empty WebP URL.
pub fn public_urls_for(
    template_id: DbId,
    images: &TemplateImages,
    storage: &dyn ObjectStorage,
) -> PublicUrls {
    if images.is_legacy() {
        tracing::debug!(template_id = %template_id, "Template uses legacy single-format image paths");
    }
    images.public_urls(|path| storage.public_url(path))
}

/// A template just written by ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct IngestedTemplate {
    pub id: DbId,
    pub images: TemplateImages,
    #[serde(rename = "publicUrls")]
    pub public_urls: PublicUrls,
}

impl IngestedTemplate {
    pub fn new(template: Template, storage: &dyn ObjectStorage) -> Self {
        let public_urls = public_urls_for(template.id, &template.images, storage);
        Self {
            id: template.id,
            images: template.images.0,
            public_urls,
        }
    }
}

/// A template enriched with its owning prompt, as returned by catalog
/// queries.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogItem {
    pub id: DbId,
    pub prompt_id: DbId,
    pub title: Option<String>,
    pub images: TemplateImages,
    pub usage: i64,
    pub created_at: Timestamp,
    pub prompt: Prompt,
    pub theme: Option<String>,
    #[serde(rename = "promptText")]
    pub prompt_text: String,
    #[serde(rename = "publicUrls")]
    pub public_urls: PublicUrls,
}

impl CatalogItem {
    pub fn new(template: Template, prompt: &Prompt, storage: &dyn ObjectStorage) -> Self {
        let public_urls = public_urls_for(template.id, &template.images, storage);
        Self {
            id: template.id,
            prompt_id: template.prompt_id,
            title: template.title,
            images: template.images.0,
            usage: template.usage,
            created_at: template.created_at,
            prompt: prompt.clone(),
            theme: prompt.theme.clone(),
            prompt_text: prompt.prompt.clone(),
            public_urls,
        }
    }
}
