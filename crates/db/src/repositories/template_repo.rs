//! Repository for the `templates` table.

use sqlx::types::Json;
use sqlx::PgPool;
use pawtrait_core::types::DbId;

use crate::models::template::{CreateTemplate, Template};
use crate::models::theme::ThemeStats;

const COLUMNS: &str = "id, prompt_id, title, images, usage, created_at";

/// Ranking order: most used first, newest first on ties.
const RANKING: &str = "usage DESC, created_at DESC, id DESC";

/// Provides inserts, ranked reads and usage updates for templates.
pub struct TemplateRepo;

impl TemplateRepo {
    /// Insert all rows in one transaction, returning the created rows.
    pub async fn create_many(
        pool: &PgPool,
        rows: &[CreateTemplate],
    ) -> Result<Vec<Template>, sqlx::Error> {
        let query = format!(
            "INSERT INTO templates (id, prompt_id, title, images) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );

        let mut tx = pool.begin().await?;
        let mut created = Vec::with_capacity(rows.len());
        for row in rows {
            let template = sqlx::query_as::<_, Template>(&query)
                .bind(row.id)
                .bind(row.prompt_id)
                .bind(&row.title)
                .bind(Json(&row.images))
                .fetch_one(&mut *tx)
                .await?;
            created.push(template);
        }
        tx.commit().await?;

        Ok(created)
    }

    /// Find a template by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Template>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM templates WHERE id = $1");
        sqlx::query_as::<_, Template>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The highest-ranked template of a prompt group.
    pub async fn top_for_prompt(
        pool: &PgPool,
        prompt_id: DbId,
    ) -> Result<Option<Template>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM templates WHERE prompt_id = $1 ORDER BY {RANKING} LIMIT 1"
        );
        sqlx::query_as::<_, Template>(&query)
            .bind(prompt_id)
            .fetch_optional(pool)
            .await
    }

    /// Every template of a prompt group, ranked.
    pub async fn list_by_prompt(
        pool: &PgPool,
        prompt_id: DbId,
    ) -> Result<Vec<Template>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM templates WHERE prompt_id = $1 ORDER BY {RANKING}");
        sqlx::query_as::<_, Template>(&query)
            .bind(prompt_id)
            .fetch_all(pool)
            .await
    }

    /// Atomically add one to `usage`. Returns the new value, or `None` if
    /// the template does not exist.
    pub async fn increment_usage(pool: &PgPool, id: DbId) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "UPDATE templates SET usage = usage + 1 WHERE id = $1 RETURNING usage",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Raise `usage` to `max(group max + 1, floor)`.
    ///
    /// The owning prompt row is locked for the duration of the transaction,
    /// so concurrent promotions within one group are serialized and each
    /// sees the previous one's result.
    pub async fn set_usage_at_least(
        pool: &PgPool,
        id: DbId,
        floor: i64,
    ) -> Result<Option<i64>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let prompt_id =
            sqlx::query_scalar::<_, DbId>("SELECT prompt_id FROM templates WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(prompt_id) = prompt_id else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("SELECT id FROM prompts WHERE id = $1 FOR UPDATE")
            .bind(prompt_id)
            .execute(&mut *tx)
            .await?;

        let usage = sqlx::query_scalar::<_, i64>(
            "UPDATE templates SET usage = GREATEST( \
                 (SELECT COALESCE(MAX(usage), 0) FROM templates WHERE prompt_id = $2) + 1, \
                 $3 \
             ) \
             WHERE id = $1 \
             RETURNING usage",
        )
        .bind(id)
        .bind(prompt_id)
        .bind(floor)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(usage)
    }

    /// Hard-delete a template, returning the removed row.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<Template>, sqlx::Error> {
        let query = format!("DELETE FROM templates WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Template>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Total number of templates.
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM templates")
            .fetch_one(pool)
            .await
    }

    /// Prompt, image and usage totals per theme, most used first.
    pub async fn theme_stats(pool: &PgPool) -> Result<Vec<ThemeStats>, sqlx::Error> {
        sqlx::query_as::<_, ThemeStats>(
            "SELECT p.theme AS theme, \
                    COUNT(DISTINCT p.id) AS prompt_count, \
                    COUNT(t.id) AS image_count, \
                    COALESCE(SUM(t.usage), 0)::BIGINT AS total_usage \
             FROM prompts p \
             LEFT JOIN templates t ON t.prompt_id = p.id \
             WHERE p.theme IS NOT NULL \
             GROUP BY p.theme \
             ORDER BY total_usage DESC, theme ASC",
        )
        .fetch_all(pool)
        .await
    }
}
