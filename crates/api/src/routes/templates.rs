//! Route definitions for the template catalog.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::templates;
use crate::state::AppState;

/// Template routes mounted at `/templates`.
///
/// ```text
/// GET    /                      -> list_templates (representatives | by-prompt)
/// POST   /upload                -> upload
/// POST   /append                -> append
/// GET    /verify                -> verify
/// DELETE /{id}                  -> delete
/// POST   /{id}/increment-usage  -> increment_usage
/// POST   /{id}/set-featured     -> set_featured
/// GET    /{id}/signed-url       -> signed_url
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(templates::list_templates))
        .route("/upload", post(templates::upload))
        .route("/append", post(templates::append))
        .route("/verify", get(templates::verify))
        .route("/{id}", delete(templates::delete))
        .route("/{id}/increment-usage", post(templates::increment_usage))
        .route("/{id}/set-featured", post(templates::set_featured))
        .route("/{id}/signed-url", get(templates::signed_url))
}
