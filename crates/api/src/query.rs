//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Query parameters for `GET /templates`.
///
/// `mode` selects `representatives` (default) or `by-prompt`. Paging values
/// are clamped by [`PageWindow`](pawtrait_core::catalog::PageWindow).
#[derive(Debug, Default, Deserialize)]
pub struct TemplateListParams {
    pub mode: Option<String>,
    pub theme: Option<String>,
    pub prompt_id: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Query parameters for `GET /templates/{id}/signed-url`.
#[derive(Debug, Default, Deserialize)]
pub struct SignedUrlParams {
    /// `orig` (default), `sm`, `md` or `lg`.
    pub size: Option<String>,
    /// `jpg` (default) or `webp`.
    pub format: Option<String>,
    /// Lifetime in seconds.
    pub ttl: Option<u64>,
}
