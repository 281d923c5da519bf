//! Usage counting and featured promotion.

use std::sync::Arc;

use pawtrait_core::access::AccessPolicy;
use pawtrait_core::catalog::FEATURED_USAGE_FLOOR;
use pawtrait_core::error::CoreError;
use pawtrait_core::types::DbId;
use pawtrait_db::CatalogStore;

use crate::error::AppResult;

pub struct UsageService {
    catalog: Arc<dyn CatalogStore>,
    access: AccessPolicy,
}

impl UsageService {
    pub fn new(catalog: Arc<dyn CatalogStore>, access: AccessPolicy) -> Self {
        Self { catalog, access }
    }

    /// Count one selection of a template. Public.
    pub async fn increment(&self, id: DbId) -> AppResult<i64> {
        let usage = self
            .catalog
            .increment_usage(id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Template",
                id,
            })?;
        tracing::debug!(template_id = %id, usage, "Template usage incremented");
        Ok(usage)
    }

    /// Make a template its prompt's representative: usage becomes one
    /// above the group's maximum, and at least [`FEATURED_USAGE_FLOOR`].
    pub async fn promote(&self, id: DbId) -> AppResult<i64> {
        self.access.require_admin()?;

        let usage = self
            .catalog
            .set_usage_at_least(id, FEATURED_USAGE_FLOOR)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Template",
                id,
            })?;
        tracing::info!(template_id = %id, usage, "Template promoted to featured");
        Ok(usage)
    }
}
