//! Repository tests against a real Postgres database.
//!
//! Run with `DATABASE_URL` set and `--ignored`:
//! - prompt dedup on `(prompt, theme)` including the unthemed case
//! - all-or-nothing template inserts
//! - ranked reads, usage increment and promotion
//! - theme listing and aggregate stats

use pawtrait_core::catalog::{ThemeFilter, FEATURED_USAGE_FLOOR};
use pawtrait_core::images::TemplateImages;
use pawtrait_core::types::DbId;
use pawtrait_db::models::prompt::CreatePrompt;
use pawtrait_db::models::template::CreateTemplate;
use pawtrait_db::repositories::{PromptRepo, TemplateRepo};
use pawtrait_db::{CatalogStore, PgCatalogStore};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_prompt(text: &str, theme: Option<&str>) -> CreatePrompt {
    CreatePrompt {
        prompt: text.to_string(),
        theme: theme.map(String::from),
        created_by: None,
    }
}

fn new_template(prompt_id: DbId) -> CreateTemplate {
    let id = DbId::new_v4();
    CreateTemplate {
        id,
        prompt_id,
        title: Some("Portrait".to_string()),
        images: TemplateImages::for_object(id),
    }
}

// ---------------------------------------------------------------------------
// Test: prompt dedup
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_prompt_dedup_with_and_without_theme(pool: PgPool) {
    let a = PromptRepo::create(&pool, &new_prompt("A {{pet_by_breed}} astronaut", None))
        .await
        .unwrap();
    let b = PromptRepo::create(&pool, &new_prompt("A {{pet_by_breed}} astronaut", None))
        .await
        .unwrap();
    assert_eq!(a.id, b.id, "unthemed prompts dedup on text alone");

    let themed = PromptRepo::create(
        &pool,
        &new_prompt("A {{pet_by_breed}} astronaut", Some("space")),
    )
    .await
    .unwrap();
    assert_ne!(themed.id, a.id);

    let found = PromptRepo::find_by_text_and_theme(&pool, "A {{pet_by_breed}} astronaut", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, a.id);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM prompts")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_prompt_dedup_accepts_long_prompts(pool: PgPool) {
    // Random text does not compress below the btree row limit.
    let text: String = (0..300).map(|_| DbId::new_v4().simple().to_string()).collect();
    assert!(text.len() > 9000);

    let first = PromptRepo::create(&pool, &new_prompt(&text, Some("space")))
        .await
        .unwrap();
    let second = PromptRepo::create(&pool, &new_prompt(&text, Some("space")))
        .await
        .unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(first.prompt, text);
}

// ---------------------------------------------------------------------------
// Test: template inserts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_create_many_rolls_back_on_missing_prompt(pool: PgPool) {
    let prompt = PromptRepo::create(&pool, &new_prompt("A dog", None)).await.unwrap();

    let rows = vec![new_template(prompt.id), new_template(DbId::new_v4())];
    assert!(TemplateRepo::create_many(&pool, &rows).await.is_err());
    assert_eq!(TemplateRepo::count(&pool).await.unwrap(), 0);

    let created = TemplateRepo::create_many(&pool, &[new_template(prompt.id)])
        .await
        .unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].usage, 0);
    assert!(created[0].images.is_complete());

    let fetched = TemplateRepo::find_by_id(&pool, created[0].id).await.unwrap().unwrap();
    assert_eq!(fetched.images.0, created[0].images.0);
}

// ---------------------------------------------------------------------------
// Test: ranking
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_top_for_prompt_prefers_usage_then_recency(pool: PgPool) {
    let prompt = PromptRepo::create(&pool, &new_prompt("A cat", Some("holiday")))
        .await
        .unwrap();
    let rows = vec![new_template(prompt.id), new_template(prompt.id)];
    let created = TemplateRepo::create_many(&pool, &rows).await.unwrap();

    sqlx::query("UPDATE templates SET usage = 5, created_at = NOW() - INTERVAL '1 hour' WHERE id = $1")
        .bind(created[0].id)
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("UPDATE templates SET usage = 5 WHERE id = $1")
        .bind(created[1].id)
        .execute(&pool)
        .await
        .unwrap();

    let top = TemplateRepo::top_for_prompt(&pool, prompt.id).await.unwrap().unwrap();
    assert_eq!(top.id, created[1].id, "ties go to the newer template");

    TemplateRepo::increment_usage(&pool, created[0].id).await.unwrap();
    let top = TemplateRepo::top_for_prompt(&pool, prompt.id).await.unwrap().unwrap();
    assert_eq!(top.id, created[0].id);

    let listed = TemplateRepo::list_by_prompt(&pool, prompt.id).await.unwrap();
    assert_eq!(listed.iter().map(|t| t.usage).collect::<Vec<_>>(), vec![6, 5]);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_increments(pool: PgPool) {
    let store = PgCatalogStore::new(pool.clone());
    let prompt = store.insert_prompt(&new_prompt("A bird", None)).await.unwrap();
    let created = store.insert_templates(&[new_template(prompt.id)]).await.unwrap();
    let id = created[0].id;

    let results = futures::future::join_all((0..20).map(|_| store.increment_usage(id))).await;
    assert!(results.iter().all(|r| matches!(r, Ok(Some(_)))));

    let template = store.find_template(id).await.unwrap().unwrap();
    assert_eq!(template.usage, 20);
    assert_eq!(store.increment_usage(DbId::new_v4()).await.unwrap(), None);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_promotion_sets_usage_above_group(pool: PgPool) {
    let prompt = PromptRepo::create(&pool, &new_prompt("A fox", Some("forest")))
        .await
        .unwrap();
    let rows = vec![new_template(prompt.id), new_template(prompt.id)];
    let created = TemplateRepo::create_many(&pool, &rows).await.unwrap();

    let usage = TemplateRepo::set_usage_at_least(&pool, created[0].id, FEATURED_USAGE_FLOOR)
        .await
        .unwrap();
    assert_eq!(usage, Some(1000));

    let usage = TemplateRepo::set_usage_at_least(&pool, created[1].id, FEATURED_USAGE_FLOOR)
        .await
        .unwrap();
    assert_eq!(usage, Some(1001));

    let top = TemplateRepo::top_for_prompt(&pool, prompt.id).await.unwrap().unwrap();
    assert_eq!(top.id, created[1].id);

    let missing = TemplateRepo::set_usage_at_least(&pool, DbId::new_v4(), FEATURED_USAGE_FLOOR)
        .await
        .unwrap();
    assert_eq!(missing, None);
}

// ---------------------------------------------------------------------------
// Test: themes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_themed_listing_and_stats(pool: PgPool) {
    let store = PgCatalogStore::new(pool);
    store.insert_prompt(&new_prompt("plain", None)).await.unwrap();
    let holiday = store
        .insert_prompt(&new_prompt("festive", Some("Holiday")))
        .await
        .unwrap();
    store
        .insert_templates(&[new_template(holiday.id), new_template(holiday.id)])
        .await
        .unwrap();

    let all = store.list_prompts_by_theme(&ThemeFilter::All).await.unwrap();
    assert_eq!(all.len(), 1);

    let filtered = store
        .list_prompts_by_theme(&ThemeFilter::parse(Some("holiday")))
        .await
        .unwrap();
    assert_eq!(filtered[0].id, holiday.id);

    let stats = store.theme_stats().await.unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].theme, "Holiday");
    assert_eq!(stats[0].prompt_count, 1);
    assert_eq!(stats[0].image_count, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_delete_returns_row(pool: PgPool) {
    let prompt = PromptRepo::create(&pool, &new_prompt("A goat", None)).await.unwrap();
    let created = TemplateRepo::create_many(&pool, &[new_template(prompt.id)])
        .await
        .unwrap();

    let deleted = TemplateRepo::delete(&pool, created[0].id).await.unwrap().unwrap();
    assert_eq!(deleted.images.storage_paths().len(), 8);
    assert!(TemplateRepo::delete(&pool, created[0].id).await.unwrap().is_none());
}
