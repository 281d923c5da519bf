//! Prompt model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use pawtrait_core::types::{DbId, Timestamp};

/// A row from the `prompts` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Prompt {
    pub id: DbId,
    pub prompt: String,
    pub theme: Option<String>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a prompt. `(prompt, theme)` is the dedup key.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePrompt {
    pub prompt: String,
    pub theme: Option<String>,
    pub created_by: Option<DbId>,
}
