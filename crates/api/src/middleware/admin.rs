//! Admin console gate.
//!
//! Catalog mutations are only served while the admin console is enabled
//! (see [`AccessPolicy`](pawtrait_core::access::AccessPolicy)). The
//! extractor rejects before the request body is read; the services enforce
//! the same policy for callers that bypass HTTP.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

/// Requires the admin console. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn upload(_: RequireAdminConsole, /* ... */) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdminConsole;

impl FromRequestParts<AppState> for RequireAdminConsole {
    type Rejection = AppError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state.config.access.require_admin()?;
        Ok(RequireAdminConsole)
    }
}
