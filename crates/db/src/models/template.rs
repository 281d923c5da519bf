//! Template model and DTOs.

use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use pawtrait_core::images::TemplateImages;
use pawtrait_core::types::{DbId, Timestamp};

/// A row from the `templates` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Template {
    pub id: DbId,
    pub prompt_id: DbId,
    pub title: Option<String>,
    pub images: Json<TemplateImages>,
    pub usage: i64,
    pub created_at: Timestamp,
}

/// DTO for inserting a template. The id is chosen by the caller because
/// it is also the storage prefix of the already-written derivatives.
#[derive(Debug, Clone)]
pub struct CreateTemplate {
    pub id: DbId,
    pub prompt_id: DbId,
    pub title: Option<String>,
    pub images: TemplateImages,
}
