pub mod health;
pub mod templates;
pub mod themes;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /templates                              representatives | by-prompt listing
/// /templates/upload                       upload (admin console)
/// /templates/append                       append (admin console)
/// /templates/verify                       catalog probe
/// /templates/{id}                         delete (admin console)
/// /templates/{id}/increment-usage         count a selection
/// /templates/{id}/set-featured            promote (admin console)
/// /templates/{id}/signed-url              time-limited derivative URL
///
/// /themes                                 theme aggregates
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/templates", templates::router())
        .nest("/themes", themes::router())
}
