//! Template ingestion: upload, append and delete.
//!
//! Every ingestion call validates all of its input before the first side
//! effect. Each file is then encoded into its eight derivatives and every
//! derivative is written to object storage before any catalog row that
//! references it is inserted. Rows for one call are inserted together or
//! not at all; objects already written for a failed call are left in place.

use std::sync::Arc;

use futures::future::try_join_all;
use futures::stream::{self, StreamExt, TryStreamExt};
use pawtrait_core::access::AccessPolicy;
use pawtrait_core::catalog::{
    is_image_content_type, normalize_optional, require_id, require_prompt_text,
};
use pawtrait_core::derivatives::{encode_derivatives, sniff_image_format};
use pawtrait_core::error::CoreError;
use pawtrait_core::images::{derivative_path, TemplateImages};
use pawtrait_core::types::DbId;
use pawtrait_db::models::prompt::{CreatePrompt, Prompt};
use pawtrait_db::models::template::CreateTemplate;
use pawtrait_db::CatalogStore;
use pawtrait_storage::{ObjectStorage, StorageCleanupResult, IMMUTABLE_CACHE_CONTROL};

use crate::error::{AppError, AppResult};
use crate::services::views::IngestedTemplate;

/// Files of one batch encoded and stored at the same time.
const MAX_CONCURRENT_FILES: usize = 4;

// ---------------------------------------------------------------------------
// Inputs and outcomes
// ---------------------------------------------------------------------------

/// One uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Upload input: files for a new or existing `(prompt, theme)` pair.
#[derive(Debug, Default)]
pub struct UploadRequest {
    pub prompt: Option<String>,
    pub title: Option<String>,
    pub theme: Option<String>,
    pub created_by: Option<DbId>,
    pub files: Vec<UploadFile>,
}

/// Append input: more files for an existing prompt.
#[derive(Debug, Default)]
pub struct AppendRequest {
    pub prompt_id: Option<String>,
    pub title: Option<String>,
    pub files: Vec<UploadFile>,
}

/// Result of an upload or append.
#[derive(Debug)]
pub struct IngestionOutcome {
    pub prompt: Prompt,
    pub title: Option<String>,
    pub items: Vec<IngestedTemplate>,
}

/// The authoritative half of a delete: the row is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowDeleteResult {
    pub id: DbId,
    pub prompt_id: DbId,
}

/// Result of a delete: the removed row plus what storage cleanup achieved.
#[derive(Debug)]
pub struct DeleteOutcome {
    pub row: RowDeleteResult,
    pub cleanup: StorageCleanupResult,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

pub struct IngestionService {
    catalog: Arc<dyn CatalogStore>,
    storage: Arc<dyn ObjectStorage>,
    access: AccessPolicy,
}

impl IngestionService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        storage: Arc<dyn ObjectStorage>,
        access: AccessPolicy,
    ) -> Self {
        Self {
            catalog,
            storage,
            access,
        }
    }

    /// Create one template per file under the prompt identified by
    /// `(prompt, theme)`, creating the prompt if it does not exist yet.
    pub async fn upload(&self, request: UploadRequest) -> AppResult<IngestionOutcome> {
        self.access.require_admin()?;

        let prompt_text = require_prompt_text(request.prompt)?;
        let theme = normalize_optional(request.theme);
        let title = normalize_optional(request.title);
        validate_files(&request.files)?;

        let images = self.store_all(request.files).await?;
        let prompt = self
            .resolve_prompt(prompt_text, theme, request.created_by)
            .await?;
        let items = self.record(prompt.id, &title, images).await?;

        tracing::info!(
            prompt_id = %prompt.id,
            count = items.len(),
            "Templates uploaded",
        );

        Ok(IngestionOutcome {
            prompt,
            title,
            items,
        })
    }

    /// Add templates to an existing prompt.
    pub async fn append(&self, request: AppendRequest) -> AppResult<IngestionOutcome> {
        self.access.require_admin()?;

        let prompt_id = require_id("prompt_id", request.prompt_id.as_deref())?;
        let title = normalize_optional(request.title);
        validate_files(&request.files)?;

        let prompt = self
            .catalog
            .find_prompt(prompt_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Prompt",
                id: prompt_id,
            })?;

        let images = self.store_all(request.files).await?;
        let items = self.record(prompt.id, &title, images).await?;

        tracing::info!(
            prompt_id = %prompt.id,
            count = items.len(),
            "Templates appended",
        );

        Ok(IngestionOutcome {
            prompt,
            title,
            items,
        })
    }

    /// Delete a template and, best-effort, its storage objects.
    ///
    /// Storage cleanup failures are logged and reported in the outcome; only
    /// a failure to delete the row fails the call.
    pub async fn delete(&self, id: DbId) -> AppResult<DeleteOutcome> {
        self.access.require_admin()?;

        let template = self
            .catalog
            .find_template(id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Template",
                id,
            })?;

        let paths = template.images.storage_paths();
        let cleanup = match self.storage.remove(&paths).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(template_id = %id, error = %e, "Storage cleanup failed");
                StorageCleanupResult::all_failed(&paths)
            }
        };
        if !cleanup.is_complete() {
            tracing::warn!(
                template_id = %id,
                failed = ?cleanup.failed,
                "Some template objects were not removed",
            );
        }

        let removed = self
            .catalog
            .delete_template(id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Template",
                id,
            })?;

        tracing::info!(
            template_id = %id,
            prompt_id = %removed.prompt_id,
            deleted_files = cleanup.removed,
            "Template deleted",
        );

        Ok(DeleteOutcome {
            row: RowDeleteResult {
                id: removed.id,
                prompt_id: removed.prompt_id,
            },
            cleanup,
        })
    }

    // -- internals --

    async fn resolve_prompt(
        &self,
        prompt: String,
        theme: Option<String>,
        created_by: Option<DbId>,
    ) -> AppResult<Prompt> {
        if let Some(existing) = self
            .catalog
            .find_prompt_by_text_and_theme(&prompt, theme.as_deref())
            .await?
        {
            return Ok(existing);
        }

        let created = self
            .catalog
            .insert_prompt(&CreatePrompt {
                prompt,
                theme,
                created_by,
            })
            .await?;
        tracing::info!(prompt_id = %created.id, theme = ?created.theme, "Prompt created");
        Ok(created)
    }

    /// Encode and store the files concurrently, returning each file's path
    /// map in request order. The first failure fails the batch.
    async fn store_all(&self, files: Vec<UploadFile>) -> AppResult<Vec<(DbId, TemplateImages)>> {
        stream::iter(files)
            .map(|file| self.store_derivatives(file))
            .buffered(MAX_CONCURRENT_FILES)
            .try_collect()
            .await
    }

    async fn store_derivatives(&self, file: UploadFile) -> AppResult<(DbId, TemplateImages)> {
        let id = DbId::new_v4();
        let source = file.bytes;
        let derivatives = tokio::task::spawn_blocking(move || encode_derivatives(&source))
            .await
            .map_err(|e| AppError::InternalError(format!("Encoder task failed: {e}")))??;

        let storage = self.storage.as_ref();
        let writes = derivatives.into_vec().into_iter().map(|derivative| {
            let path = derivative_path(id, derivative.size, derivative.format);
            async move {
                storage
                    .put(
                        &path,
                        derivative.bytes,
                        derivative.format.content_type(),
                        IMMUTABLE_CACHE_CONTROL,
                    )
                    .await
            }
        });
        try_join_all(writes).await?;

        tracing::debug!(
            template_id = %id,
            file_name = file.file_name.as_deref().unwrap_or(""),
            backend = storage.backend_tag(),
            "Derivatives stored",
        );

        Ok((id, TemplateImages::for_object(id)))
    }

    async fn record(
        &self,
        prompt_id: DbId,
        title: &Option<String>,
        images: Vec<(DbId, TemplateImages)>,
    ) -> AppResult<Vec<IngestedTemplate>> {
        let rows: Vec<CreateTemplate> = images
            .into_iter()
            .map(|(id, images)| CreateTemplate {
                id,
                prompt_id,
                title: title.clone(),
                images,
            })
            .collect();

        let created = self.catalog.insert_templates(&rows).await?;
        Ok(created
            .into_iter()
            .map(|template| IngestedTemplate::new(template, self.storage.as_ref()))
            .collect())
    }
}

/// Reject the batch unless it is non-empty and every file is an image by
/// both declared content type and leading bytes.
fn validate_files(files: &[UploadFile]) -> Result<(), CoreError> {
    if files.is_empty() {
        return Err(CoreError::Validation("file is required".into()));
    }
    for file in files {
        if !is_image_content_type(file.content_type.as_deref()) {
            return Err(CoreError::Validation("only image files are allowed".into()));
        }
        sniff_image_format(&file.bytes)?;
    }
    Ok(())
}
