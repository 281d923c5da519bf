//! Handlers for the template catalog.
//!
//! Mutations (upload, append, delete, set-featured) require the admin
//! console; listing, verification and usage counting are public.

use axum::extract::{Multipart, State};
use axum::http::header::CACHE_CONTROL;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pawtrait_core::catalog::{require_id, PageWindow, ThemeFilter};
use pawtrait_core::error::CoreError;
use pawtrait_core::images::{ImageSize, OutputFormat};
use pawtrait_core::types::DbId;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::extract::{ApiPath, ApiQuery};
use crate::middleware::admin::RequireAdminConsole;
use crate::query::{SignedUrlParams, TemplateListParams};
use crate::services::ingestion::{AppendRequest, IngestionOutcome, UploadFile, UploadRequest};
use crate::services::views::IngestedTemplate;
use crate::state::AppState;

/// Cache directive for catalog listings: five minutes at the edge, then
/// ten more minutes of stale-while-revalidate.
pub const LIST_CACHE_CONTROL: &str = "public, s-maxage=300, stale-while-revalidate=600";

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Response for upload and append.
#[derive(Debug, Serialize)]
pub struct IngestionResponse {
    pub prompt: String,
    pub title: Option<String>,
    pub theme: Option<String>,
    #[serde(rename = "promptId")]
    pub prompt_id: DbId,
    pub items: Vec<IngestedTemplate>,
}

impl From<IngestionOutcome> for IngestionResponse {
    fn from(outcome: IngestionOutcome) -> Self {
        Self {
            prompt: outcome.prompt.prompt,
            title: outcome.title,
            theme: outcome.prompt.theme,
            prompt_id: outcome.prompt.id,
            items: outcome.items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub id: DbId,
    pub prompt_id: DbId,
    #[serde(rename = "deletedFiles")]
    pub deleted_files: usize,
}

#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub success: bool,
    pub id: DbId,
    pub usage: i64,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub ok: bool,
    pub count: i64,
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// GET /api/v1/templates?mode=representatives&theme=&page=&limit=
/// GET /api/v1/templates?mode=by-prompt&prompt_id=
pub async fn list_templates(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<TemplateListParams>,
) -> AppResult<Response> {
    match params.mode.as_deref().unwrap_or("representatives") {
        "representatives" => {
            let filter = ThemeFilter::parse(params.theme.as_deref());
            let window = PageWindow::new(params.page, params.limit);
            let page = state.queries.representatives(&filter, window).await?;
            Ok(cached(page))
        }
        "by-prompt" => {
            let prompt_id = require_id("prompt_id", params.prompt_id.as_deref())?;
            let listing = state.queries.by_prompt(prompt_id).await?;
            Ok(cached(listing))
        }
        other => Err(AppError::BadRequest(format!(
            "mode must be 'representatives' or 'by-prompt', got '{other}'"
        ))),
    }
}

fn cached<T: Serialize>(body: T) -> Response {
    ([(CACHE_CONTROL, LIST_CACHE_CONTROL)], Json(body)).into_response()
}

/// GET /api/v1/templates/verify
pub async fn verify(State(state): State<AppState>) -> AppResult<Json<VerifyResponse>> {
    let count = state.queries.count_templates().await?;
    Ok(Json(VerifyResponse { ok: true, count }))
}

/// GET /api/v1/templates/{id}/signed-url?size=&format=&ttl=
pub async fn signed_url(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<DbId>,
    ApiQuery(params): ApiQuery<SignedUrlParams>,
) -> AppResult<impl IntoResponse> {
    let size = match params.size.as_deref() {
        None => ImageSize::Orig,
        Some(key) => ImageSize::from_key(key)
            .ok_or_else(|| CoreError::Validation(format!("unknown size '{key}'")))?,
    };
    let format = match params.format.as_deref() {
        None => OutputFormat::Jpg,
        Some(ext) => OutputFormat::from_extension(ext)
            .ok_or_else(|| CoreError::Validation(format!("unknown format '{ext}'")))?,
    };

    let signed = state.queries.signed_url(id, size, format, params.ttl).await?;
    Ok(Json(signed))
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

/// POST /api/v1/templates/upload
///
/// Multipart: `files` / `files[]` / `file`, `prompt`, optional `title`
/// and `theme`.
pub async fn upload(
    _admin: RequireAdminConsole,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut form = UploadForm::read(multipart).await?;
    let outcome = state
        .ingestion
        .upload(UploadRequest {
            prompt: form.take("prompt"),
            title: form.take("title"),
            theme: form.take("theme"),
            created_by: None,
            files: form.into_files(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(IngestionResponse::from(outcome))))
}

/// POST /api/v1/templates/append
///
/// Multipart: `files` / `files[]` / `file`, `prompt_id`, optional `title`.
pub async fn append(
    _admin: RequireAdminConsole,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut form = UploadForm::read(multipart).await?;
    let outcome = state
        .ingestion
        .append(AppendRequest {
            prompt_id: form.take("prompt_id"),
            title: form.take("title"),
            files: form.into_files(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(IngestionResponse::from(outcome))))
}

/// DELETE /api/v1/templates/{id}
pub async fn delete(
    _admin: RequireAdminConsole,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<DbId>,
) -> AppResult<Json<DeleteResponse>> {
    let outcome = state.ingestion.delete(id).await?;
    Ok(Json(DeleteResponse {
        success: true,
        id: outcome.row.id,
        prompt_id: outcome.row.prompt_id,
        deleted_files: outcome.cleanup.removed,
    }))
}

// ---------------------------------------------------------------------------
// Usage
// ---------------------------------------------------------------------------

/// POST /api/v1/templates/{id}/increment-usage
pub async fn increment_usage(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<DbId>,
) -> AppResult<Json<UsageResponse>> {
    let usage = state.usage.increment(id).await?;
    Ok(Json(UsageResponse {
        success: true,
        id,
        usage,
    }))
}

/// POST /api/v1/templates/{id}/set-featured
pub async fn set_featured(
    _admin: RequireAdminConsole,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<DbId>,
) -> AppResult<Json<UsageResponse>> {
    let usage = state.usage.promote(id).await?;
    Ok(Json(UsageResponse {
        success: true,
        id,
        usage,
    }))
}

// ---------------------------------------------------------------------------
// Multipart form
// ---------------------------------------------------------------------------

/// A parsed upload form. Files may arrive under `files`, `files[]` or
/// `file`; they are returned in that order.
#[derive(Debug, Default)]
struct UploadForm {
    files: Vec<UploadFile>,
    files_array: Vec<UploadFile>,
    file: Vec<UploadFile>,
    fields: Vec<(String, String)>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "files" | "files[]" | "file" => {
                    let file_name = field.file_name().map(String::from);
                    let content_type = field.content_type().map(String::from);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    let upload = UploadFile {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    };
                    match name.as_str() {
                        "files" => form.files.push(upload),
                        "files[]" => form.files_array.push(upload),
                        _ => form.file.push(upload),
                    }
                }
                _ => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    form.fields.push((name, value));
                }
            }
        }

        Ok(form)
    }

    /// Remove and return the first value of a text field.
    fn take(&mut self, name: &str) -> Option<String> {
        let index = self.fields.iter().position(|(key, _)| key == name)?;
        Some(self.fields.remove(index).1)
    }

    fn into_files(self) -> Vec<UploadFile> {
        let mut files = self.files;
        files.extend(self.files_array);
        files.extend(self.file);
        files
    }
}
