use axum::routing::get;
use axum::Router;

use crate::handlers::themes;
use crate::state::AppState;

/// Theme routes mounted at `/themes`.
///
/// ```text
/// GET /  -> list_themes
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(themes::list_themes))
}
