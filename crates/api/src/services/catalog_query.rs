//! Read side of the catalog: representatives, by-prompt listings and the
//! auxiliary probes built on them.

use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use pawtrait_core::catalog::{clamp_signed_url_ttl, PageWindow, ThemeFilter};
use pawtrait_core::error::CoreError;
use pawtrait_core::images::{ImageSize, OutputFormat};
use pawtrait_core::types::DbId;
use pawtrait_db::models::theme::ThemeStats;
use pawtrait_db::CatalogStore;
use pawtrait_storage::ObjectStorage;
use serde::Serialize;

use crate::error::AppResult;
use crate::services::views::CatalogItem;

/// One page of representatives: one top template per prompt.
#[derive(Debug, Serialize)]
pub struct RepresentativesPage {
    pub items: Vec<CatalogItem>,
    pub count: usize,
    pub page: i64,
    pub limit: i64,
    /// Prompts matching the filter, not templates.
    pub total: i64,
}

/// Every template of one prompt, ranked.
#[derive(Debug, Serialize)]
pub struct PromptTemplates {
    pub items: Vec<CatalogItem>,
    pub count: usize,
}

/// A time-limited URL for one derivative.
#[derive(Debug, Serialize)]
pub struct SignedDerivativeUrl {
    pub url: String,
    pub expires_in: u64,
}

pub struct CatalogQueryService {
    catalog: Arc<dyn CatalogStore>,
    storage: Arc<dyn ObjectStorage>,
}

impl CatalogQueryService {
    pub fn new(catalog: Arc<dyn CatalogStore>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { catalog, storage }
    }

    /// Page through prompts matching `filter` and return each one's
    /// highest-ranked template. Prompts without templates are skipped.
    pub async fn representatives(
        &self,
        filter: &ThemeFilter,
        window: PageWindow,
    ) -> AppResult<RepresentativesPage> {
        let prompts = self.catalog.list_prompts_by_theme(filter).await?;
        let total = prompts.len() as i64;
        let page = window.slice(&prompts);

        let tops = try_join_all(
            page.iter()
                .map(|prompt| self.catalog.top_template_for_prompt(prompt.id)),
        )
        .await?;

        let items: Vec<CatalogItem> = page
            .iter()
            .zip(tops)
            .filter_map(|(prompt, top)| {
                top.map(|template| CatalogItem::new(template, prompt, self.storage.as_ref()))
            })
            .collect();

        tracing::debug!(
            theme = ?filter.theme(),
            page = window.page,
            items = items.len(),
            total,
            "Representatives listed",
        );

        Ok(RepresentativesPage {
            count: items.len(),
            items,
            page: window.page,
            limit: window.limit,
            total,
        })
    }

    /// All templates of one prompt, ranked. An unknown prompt has no
    /// templates.
    pub async fn by_prompt(&self, prompt_id: DbId) -> AppResult<PromptTemplates> {
        let Some(prompt) = self.catalog.find_prompt(prompt_id).await? else {
            return Ok(PromptTemplates {
                items: Vec::new(),
                count: 0,
            });
        };

        let items: Vec<CatalogItem> = self
            .catalog
            .list_templates_by_prompt(prompt_id)
            .await?
            .into_iter()
            .map(|template| CatalogItem::new(template, &prompt, self.storage.as_ref()))
            .collect();

        Ok(PromptTemplates {
            count: items.len(),
            items,
        })
    }

    /// Total template count; doubles as a catalog reachability probe.
    pub async fn count_templates(&self) -> AppResult<i64> {
        Ok(self.catalog.count_templates().await?)
    }

    pub async fn theme_stats(&self) -> AppResult<Vec<ThemeStats>> {
        Ok(self.catalog.theme_stats().await?)
    }

    /// Signed URL for one stored derivative of a template.
    pub async fn signed_url(
        &self,
        id: DbId,
        size: ImageSize,
        format: OutputFormat,
        ttl_secs: Option<u64>,
    ) -> AppResult<SignedDerivativeUrl> {
        let template = self
            .catalog
            .find_template(id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Template",
                id,
            })?;

        let paths = template.images.paths(size);
        let path = paths.get(format);
        if path.is_empty() {
            return Err(CoreError::Validation(format!(
                "template has no {} derivative for size {}",
                format.extension(),
                size.key()
            ))
            .into());
        }

        let expires_in = clamp_signed_url_ttl(ttl_secs);
        let url = self
            .storage
            .signed_url(path, Duration::from_secs(expires_in))
            .await?;

        Ok(SignedDerivativeUrl { url, expires_in })
    }
}
