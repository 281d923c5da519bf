//! Repository for the `prompts` table.

use sqlx::PgPool;
use pawtrait_core::types::DbId;
use uuid::Uuid;

use crate::models::prompt::{CreatePrompt, Prompt};

const COLUMNS: &str = "id, prompt, theme, created_by, created_at, updated_at";

/// Provides lookups and inserts for prompts.
pub struct PromptRepo;

impl PromptRepo {
    /// Insert a prompt, or return the existing row with the same
    /// `(prompt, theme)` if one already exists.
    ///
    /// Racing inserts of the same pair converge on one row through the
    /// `uq_prompts_prompt_theme` index.
    pub async fn create(pool: &PgPool, input: &CreatePrompt) -> Result<Prompt, sqlx::Error> {
        let query = format!(
            "INSERT INTO prompts (id, prompt, theme, created_by) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT ((md5(prompt)), (md5(COALESCE(theme, '')))) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, Prompt>(&query)
            .bind(Uuid::new_v4())
            .bind(&input.prompt)
            .bind(&input.theme)
            .bind(input.created_by)
            .fetch_optional(pool)
            .await?;

        match inserted {
            Some(prompt) => Ok(prompt),
            None => Self::find_by_text_and_theme(pool, &input.prompt, input.theme.as_deref())
                .await?
                .ok_or(sqlx::Error::RowNotFound),
        }
    }

    /// Find a prompt by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Prompt>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM prompts WHERE id = $1");
        sqlx::query_as::<_, Prompt>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Exact match on prompt text and theme. A `None` theme matches only
    /// prompts stored without a theme.
    pub async fn find_by_text_and_theme(
        pool: &PgPool,
        text: &str,
        theme: Option<&str>,
    ) -> Result<Option<Prompt>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM prompts \
             WHERE md5(prompt) = md5($1::text) \
               AND md5(COALESCE(theme, '')) = md5(COALESCE($2::text, '')) \
               AND prompt = $1 AND theme IS NOT DISTINCT FROM $2 \
             LIMIT 1"
        );
        sqlx::query_as::<_, Prompt>(&query)
            .bind(text)
            .bind(theme)
            .fetch_optional(pool)
            .await
    }

    /// List themed prompts, newest first. With `theme`, only prompts whose
    /// theme matches case-insensitively.
    pub async fn list_themed(
        pool: &PgPool,
        theme: Option<&str>,
    ) -> Result<Vec<Prompt>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM prompts \
             WHERE theme IS NOT NULL \
               AND ($1::text IS NULL OR lower(theme) = lower($1)) \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Prompt>(&query)
            .bind(theme)
            .fetch_all(pool)
            .await
    }
}
