//! The catalog store seam.
//!
//! Services depend on [`CatalogStore`] rather than on a pool so the same
//! ingestion and query logic runs against Postgres in production and the
//! in-memory store in tests.

use async_trait::async_trait;
use pawtrait_core::catalog::ThemeFilter;
use pawtrait_core::types::DbId;

use crate::models::prompt::{CreatePrompt, Prompt};
use crate::models::template::{CreateTemplate, Template};
use crate::models::theme::ThemeStats;
use crate::repositories::{PromptRepo, TemplateRepo};
use crate::DbPool;

/// Relational persistence for prompts and templates.
///
/// Ranked reads order by `usage` descending, then `created_at` descending.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Short backend name for logs.
    fn backend_tag(&self) -> &'static str;

    /// Cheap reachability probe.
    async fn ping(&self) -> Result<(), sqlx::Error>;

    async fn find_prompt(&self, id: DbId) -> Result<Option<Prompt>, sqlx::Error>;

    /// Dedup lookup: exact match on text, and on theme with `None` matching
    /// only unthemed prompts.
    async fn find_prompt_by_text_and_theme(
        &self,
        text: &str,
        theme: Option<&str>,
    ) -> Result<Option<Prompt>, sqlx::Error>;

    /// Insert a prompt; returns the existing row if the pair already exists.
    async fn insert_prompt(&self, input: &CreatePrompt) -> Result<Prompt, sqlx::Error>;

    /// Themed prompts matching `filter`, newest first.
    async fn list_prompts_by_theme(&self, filter: &ThemeFilter)
        -> Result<Vec<Prompt>, sqlx::Error>;

    /// Insert all rows or none.
    async fn insert_templates(&self, rows: &[CreateTemplate])
        -> Result<Vec<Template>, sqlx::Error>;

    async fn find_template(&self, id: DbId) -> Result<Option<Template>, sqlx::Error>;

    async fn top_template_for_prompt(
        &self,
        prompt_id: DbId,
    ) -> Result<Option<Template>, sqlx::Error>;

    async fn list_templates_by_prompt(&self, prompt_id: DbId)
        -> Result<Vec<Template>, sqlx::Error>;

    /// Add exactly one to `usage` without losing concurrent updates.
    /// `None` if the template does not exist.
    async fn increment_usage(&self, id: DbId) -> Result<Option<i64>, sqlx::Error>;

    /// Set `usage` to `max(group max + 1, floor)` atomically with respect
    /// to other promotions in the same group.
    async fn set_usage_at_least(&self, id: DbId, floor: i64) -> Result<Option<i64>, sqlx::Error>;

    /// Delete a template, returning the row so callers can clean up its
    /// storage objects.
    async fn delete_template(&self, id: DbId) -> Result<Option<Template>, sqlx::Error>;

    async fn count_templates(&self) -> Result<i64, sqlx::Error>;

    async fn theme_stats(&self) -> Result<Vec<ThemeStats>, sqlx::Error>;
}

/// [`CatalogStore`] over a Postgres pool.
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: DbPool,
}

impl PgCatalogStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        crate::health_check(&self.pool).await
    }

    async fn find_prompt(&self, id: DbId) -> Result<Option<Prompt>, sqlx::Error> {
        PromptRepo::find_by_id(&self.pool, id).await
    }

    async fn find_prompt_by_text_and_theme(
        &self,
        text: &str,
        theme: Option<&str>,
    ) -> Result<Option<Prompt>, sqlx::Error> {
        PromptRepo::find_by_text_and_theme(&self.pool, text, theme).await
    }

    async fn insert_prompt(&self, input: &CreatePrompt) -> Result<Prompt, sqlx::Error> {
        PromptRepo::create(&self.pool, input).await
    }

    async fn list_prompts_by_theme(
        &self,
        filter: &ThemeFilter,
    ) -> Result<Vec<Prompt>, sqlx::Error> {
        PromptRepo::list_themed(&self.pool, filter.theme()).await
    }

    async fn insert_templates(
        &self,
        rows: &[CreateTemplate],
    ) -> Result<Vec<Template>, sqlx::Error> {
        TemplateRepo::create_many(&self.pool, rows).await
    }

    async fn find_template(&self, id: DbId) -> Result<Option<Template>, sqlx::Error> {
        TemplateRepo::find_by_id(&self.pool, id).await
    }

    async fn top_template_for_prompt(
        &self,
        prompt_id: DbId,
    ) -> Result<Option<Template>, sqlx::Error> {
        TemplateRepo::top_for_prompt(&self.pool, prompt_id).await
    }

    async fn list_templates_by_prompt(
        &self,
        prompt_id: DbId,
    ) -> Result<Vec<Template>, sqlx::Error> {
        TemplateRepo::list_by_prompt(&self.pool, prompt_id).await
    }

    async fn increment_usage(&self, id: DbId) -> Result<Option<i64>, sqlx::Error> {
        TemplateRepo::increment_usage(&self.pool, id).await
    }

    async fn set_usage_at_least(&self, id: DbId, floor: i64) -> Result<Option<i64>, sqlx::Error> {
        TemplateRepo::set_usage_at_least(&self.pool, id, floor).await
    }

    async fn delete_template(&self, id: DbId) -> Result<Option<Template>, sqlx::Error> {
        TemplateRepo::delete(&self.pool, id).await
    }

    async fn count_templates(&self) -> Result<i64, sqlx::Error> {
        TemplateRepo::count(&self.pool).await
    }

    async fn theme_stats(&self) -> Result<Vec<ThemeStats>, sqlx::Error> {
        TemplateRepo::theme_stats(&self.pool).await
    }
}
