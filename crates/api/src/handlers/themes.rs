//! Handlers for theme aggregates.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/themes
///
/// Prompt count, template count and total usage per theme, most used first.
pub async fn list_themes(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let stats = state.queries.theme_stats().await?;
    Ok(Json(DataResponse { data: stats }))
}
