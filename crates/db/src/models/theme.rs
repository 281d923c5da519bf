use serde::Serialize;
use sqlx::FromRow;

/// Usage aggregate for one theme, computed at query time.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct ThemeStats {
    pub theme: String,
    pub prompt_count: i64,
    pub image_count: i64,
    pub total_usage: i64,
}
