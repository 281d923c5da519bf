//! S3-compatible storage backend.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client as S3Client;
use tracing::{debug, info, instrument, warn};

use crate::{join_public_url, ObjectStorage, StorageCleanupResult, StorageConfig, StorageError};

/// S3's per-request limit for `DeleteObjects`.
const MAX_DELETE_BATCH: usize = 1000;

/// Object storage backed by an S3 bucket.
pub struct S3Storage {
    client: S3Client,
    bucket: String,
    public_base_url: String,
}

impl S3Storage {
    /// Build a client from the ambient AWS credentials and `config`.
    pub async fn new(config: &StorageConfig) -> Self {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;

        let mut s3_config_builder = S3ConfigBuilder::from(&aws_config);

        if let Some(ref endpoint_url) = config.endpoint_url {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint_url);
        }

        if config.force_path_style {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        let client = S3Client::from_conf(s3_config_builder.build());

        info!(
            bucket = %config.bucket,
            region = %config.region,
            endpoint = config.endpoint_url.as_deref().unwrap_or("aws"),
            "S3 storage initialized"
        );

        Self {
            client,
            bucket: config.bucket.clone(),
            public_base_url: config.public_base_url.clone(),
        }
    }

    async fn remove_batch(&self, paths: &[String]) -> Result<StorageCleanupResult, StorageError> {
        let objects = paths
            .iter()
            .map(|path| ObjectIdentifier::builder().key(path).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StorageError::Delete(e.to_string()))?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(false)
            .build()
            .map_err(|e| StorageError::Delete(e.to_string()))?;

        let response = self
            .client
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| StorageError::Delete(e.to_string()))?;

        let failed: Vec<String> = response
            .errors()
            .iter()
            .filter_map(|err| {
                if let Some(message) = err.message() {
                    debug!(key = err.key().unwrap_or(""), message, "S3 refused delete");
                }
                err.key().map(String::from)
            })
            .collect();

        Ok(StorageCleanupResult {
            removed: response.deleted().len(),
            failed,
        })
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    fn backend_tag(&self) -> &'static str {
        "s3"
    }

    #[instrument(skip(self, bytes), fields(size_bytes = bytes.len()))]
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        cache_control: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .cache_control(cache_control)
            .send()
            .await
            .map_err(|e| StorageError::Write {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        debug!(path, "Object stored");
        Ok(())
    }

    #[instrument(skip(self, paths), fields(count = paths.len()))]
    async fn remove(&self, paths: &[String]) -> Result<StorageCleanupResult, StorageError> {
        if paths.is_empty() {
            return Ok(StorageCleanupResult::default());
        }
        if paths.len() <= MAX_DELETE_BATCH {
            return self.remove_batch(paths).await;
        }

        let mut total = StorageCleanupResult::default();
        for chunk in paths.chunks(MAX_DELETE_BATCH) {
            match self.remove_batch(chunk).await {
                Ok(batch) => {
                    total.removed += batch.removed;
                    total.failed.extend(batch.failed);
                }
                Err(e) => {
                    warn!(error = %e, "S3 delete batch failed");
                    total.failed.extend(chunk.iter().cloned());
                }
            }
        }
        Ok(total)
    }

    fn public_url(&self, path: &str) -> String {
        join_public_url(&self.public_base_url, path)
    }

    async fn signed_url(&self, path: &str, ttl: Duration) -> Result<String, StorageError> {
        let presign_error = |message: String| StorageError::Presign {
            path: path.to_string(),
            message,
        };

        let presigning_config =
            PresigningConfig::expires_in(ttl).map_err(|e| presign_error(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .presigned(presigning_config)
            .await
            .map_err(|e| presign_error(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }
}
