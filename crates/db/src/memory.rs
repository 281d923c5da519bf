//! In-process catalog store.
//!
//! Mirrors the Postgres semantics the services rely on: prompt dedup on
//! `(prompt, theme)`, all-or-nothing template inserts, ranked reads and
//! lock-protected usage updates. Backs the API integration tests.

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use pawtrait_core::catalog::{featured_usage, ThemeFilter};
use pawtrait_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use tokio::sync::Mutex;

use crate::models::prompt::{CreatePrompt, Prompt};
use crate::models::template::{CreateTemplate, Template};
use crate::models::theme::ThemeStats;
use crate::store::CatalogStore;

#[derive(Default)]
struct Inner {
    prompts: Vec<Prompt>,
    templates: Vec<Template>,
}

#[derive(Default)]
pub struct MemoryCatalogStore {
    inner: Mutex<Inner>,
    fail_template_deletes: AtomicBool,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `delete_template` fail.
    pub fn set_fail_template_deletes(&self, fail: bool) {
        self.fail_template_deletes.store(fail, Ordering::SeqCst);
    }

    /// Insert a prompt row as-is, bypassing dedup.
    pub async fn seed_prompt(&self, prompt: Prompt) {
        self.inner.lock().await.prompts.push(prompt);
    }

    /// Insert a template row as-is, bypassing validation.
    pub async fn seed_template(&self, template: Template) {
        self.inner.lock().await.templates.push(template);
    }

    pub async fn prompt_count(&self) -> usize {
        self.inner.lock().await.prompts.len()
    }
}

/// Ranking order: `usage` desc, `created_at` desc, `id` desc.
fn rank(a: &Template, b: &Template) -> CmpOrdering {
    b.usage
        .cmp(&a.usage)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}

fn ranked_group(templates: &[Template], prompt_id: DbId) -> Vec<Template> {
    let mut group: Vec<Template> = templates
        .iter()
        .filter(|t| t.prompt_id == prompt_id)
        .cloned()
        .collect();
    group.sort_by(rank);
    group
}

fn newest_first(a: &Prompt, b: &Prompt) -> CmpOrdering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        Ok(())
    }

    async fn find_prompt(&self, id: DbId) -> Result<Option<Prompt>, sqlx::Error> {
        let inner = self.inner.lock().await;
        Ok(inner.prompts.iter().find(|p| p.id == id).cloned())
    }

    async fn find_prompt_by_text_and_theme(
        &self,
        text: &str,
        theme: Option<&str>,
    ) -> Result<Option<Prompt>, sqlx::Error> {
        let inner = self.inner.lock().await;
        Ok(inner
            .prompts
            .iter()
            .find(|p| p.prompt == text && p.theme.as_deref() == theme)
            .cloned())
    }

    async fn insert_prompt(&self, input: &CreatePrompt) -> Result<Prompt, sqlx::Error> {
        let mut inner = self.inner.lock().await;
        if let Some(existing) = inner
            .prompts
            .iter()
            .find(|p| p.prompt == input.prompt && p.theme == input.theme)
        {
            return Ok(existing.clone());
        }

        let now: Timestamp = Utc::now();
        let prompt = Prompt {
            id: DbId::new_v4(),
            prompt: input.prompt.clone(),
            theme: input.theme.clone(),
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
        };
        inner.prompts.push(prompt.clone());
        Ok(prompt)
    }

    async fn list_prompts_by_theme(
        &self,
        filter: &ThemeFilter,
    ) -> Result<Vec<Prompt>, sqlx::Error> {
        let inner = self.inner.lock().await;
        let mut prompts: Vec<Prompt> = inner
            .prompts
            .iter()
            .filter(|p| filter.matches(p.theme.as_deref()))
            .cloned()
            .collect();
        prompts.sort_by(newest_first);
        Ok(prompts)
    }

    async fn insert_templates(
        &self,
        rows: &[CreateTemplate],
    ) -> Result<Vec<Template>, sqlx::Error> {
        let mut inner = self.inner.lock().await;

        for (i, row) in rows.iter().enumerate() {
            if !inner.prompts.iter().any(|p| p.id == row.prompt_id) {
                return Err(sqlx::Error::Protocol(format!(
                    "templates.prompt_id references missing prompt {}",
                    row.prompt_id
                )));
            }
            let duplicate = inner.templates.iter().any(|t| t.id == row.id)
                || rows[..i].iter().any(|r| r.id == row.id);
            if duplicate {
                return Err(sqlx::Error::Protocol(format!(
                    "duplicate template id {}",
                    row.id
                )));
            }
        }

        let now: Timestamp = Utc::now();
        let created: Vec<Template> = rows
            .iter()
            .map(|row| Template {
                id: row.id,
                prompt_id: row.prompt_id,
                title: row.title.clone(),
                images: Json(row.images.clone()),
                usage: 0,
                created_at: now,
            })
            .collect();
        inner.templates.extend(created.iter().cloned());
        Ok(created)
    }

    async fn find_template(&self, id: DbId) -> Result<Option<Template>, sqlx::Error> {
        let inner = self.inner.lock().await;
        Ok(inner.templates.iter().find(|t| t.id == id).cloned())
    }

    async fn top_template_for_prompt(
        &self,
        prompt_id: DbId,
    ) -> Result<Option<Template>, sqlx::Error> {
        let inner = self.inner.lock().await;
        Ok(ranked_group(&inner.templates, prompt_id).into_iter().next())
    }

    async fn list_templates_by_prompt(
        &self,
        prompt_id: DbId,
    ) -> Result<Vec<Template>, sqlx::Error> {
        let inner = self.inner.lock().await;
        Ok(ranked_group(&inner.templates, prompt_id))
    }

    async fn increment_usage(&self, id: DbId) -> Result<Option<i64>, sqlx::Error> {
        let mut inner = self.inner.lock().await;
        Ok(inner.templates.iter_mut().find(|t| t.id == id).map(|t| {
            t.usage = t.usage.saturating_add(1);
            t.usage
        }))
    }

    async fn set_usage_at_least(&self, id: DbId, floor: i64) -> Result<Option<i64>, sqlx::Error> {
        let mut inner = self.inner.lock().await;
        let Some(prompt_id) = inner
            .templates
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.prompt_id)
        else {
            return Ok(None);
        };

        let group_max = inner
            .templates
            .iter()
            .filter(|t| t.prompt_id == prompt_id)
            .map(|t| t.usage)
            .max()
            .unwrap_or(0);
        let usage = featured_usage(group_max, floor);

        if let Some(template) = inner.templates.iter_mut().find(|t| t.id == id) {
            template.usage = usage;
        }
        Ok(Some(usage))
    }

    async fn delete_template(&self, id: DbId) -> Result<Option<Template>, sqlx::Error> {
        if self.fail_template_deletes.load(Ordering::SeqCst) {
            return Err(sqlx::Error::Protocol("simulated delete failure".into()));
        }
        let mut inner = self.inner.lock().await;
        let position = inner.templates.iter().position(|t| t.id == id);
        Ok(position.map(|i| inner.templates.remove(i)))
    }

    async fn count_templates(&self) -> Result<i64, sqlx::Error> {
        let inner = self.inner.lock().await;
        Ok(inner.templates.len() as i64)
    }

    async fn theme_stats(&self) -> Result<Vec<ThemeStats>, sqlx::Error> {
        let inner = self.inner.lock().await;
        let mut stats: Vec<ThemeStats> = Vec::new();

        for prompt in &inner.prompts {
            let Some(theme) = prompt.theme.as_deref() else {
                continue;
            };
            let group = inner.templates.iter().filter(|t| t.prompt_id == prompt.id);
            let (image_count, total_usage) =
                group.fold((0i64, 0i64), |(n, u), t| (n + 1, u + t.usage));

            match stats.iter_mut().find(|s| s.theme == theme) {
                Some(entry) => {
                    entry.prompt_count += 1;
                    entry.image_count += image_count;
                    entry.total_usage += total_usage;
                }
                None => stats.push(ThemeStats {
                    theme: theme.to_string(),
                    prompt_count: 1,
                    image_count,
                    total_usage,
                }),
            }
        }

        stats.sort_by(|a, b| {
            b.total_usage
                .cmp(&a.total_usage)
                .then_with(|| a.theme.cmp(&b.theme))
        });
        Ok(stats)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
