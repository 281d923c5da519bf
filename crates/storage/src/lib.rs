//! Object storage gateway for template derivatives.
//!
//! [`ObjectStorage`] is the seam between ingestion and the object store.
//! Objects live at `{uuid}/{size}.{ext}`; every path embeds a freshly
//! generated id, so content at a path never changes and can be cached
//! forever. [`S3Storage`] talks to S3-compatible services, [`MemoryStorage`]
//! keeps objects in process for tests and local runs.

pub mod config;
pub mod memory;
pub mod s3;

use std::time::Duration;

use async_trait::async_trait;

pub use config::StorageConfig;
pub use memory::MemoryStorage;
pub use s3::S3Storage;

/// Cache directive for derivative objects.
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Errors raised by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to write object '{path}': {message}")]
    Write { path: String, message: String },

    #[error("Failed to delete objects: {0}")]
    Delete(String),

    #[error("Failed to sign URL for '{path}': {message}")]
    Presign { path: String, message: String },
}

/// Outcome of a best-effort batch removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageCleanupResult {
    /// Number of objects actually removed.
    pub removed: usize,
    /// Paths that were missing or could not be removed.
    pub failed: Vec<String>,
}

impl StorageCleanupResult {
    /// Every path was treated as failed (e.g. the whole call errored).
    pub fn all_failed(paths: &[String]) -> Self {
        Self {
            removed: 0,
            failed: paths.to_vec(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A binary object store addressed by path.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Short backend name for logs.
    fn backend_tag(&self) -> &'static str;

    /// Store `bytes` at `path`, overwriting any existing object.
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        cache_control: &str,
    ) -> Result<(), StorageError>;

    /// Remove `paths`. Per-object failures are reported in the result;
    /// `Err` means the call as a whole failed.
    async fn remove(&self, paths: &[String]) -> Result<StorageCleanupResult, StorageError>;

    /// Stable public URL for `path`. No network round-trip.
    fn public_url(&self, path: &str) -> String;

    /// Time-limited URL for `path`.
    async fn signed_url(&self, path: &str, ttl: Duration) -> Result<String, StorageError>;
}

/// Join a public base URL and an object path with exactly one slash.
pub fn join_public_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_public_url_normalizes_slashes() {
        assert_eq!(
            join_public_url("https://cdn.test/templates/", "/abc/sm.jpg"),
            "https://cdn.test/templates/abc/sm.jpg"
        );
        assert_eq!(
            join_public_url("https://cdn.test/templates", "abc/sm.webp"),
            "https://cdn.test/templates/abc/sm.webp"
        );
    }

    #[test]
    fn cleanup_result_completeness() {
        let paths = vec!["a/sm.jpg".to_string(), "a/sm.webp".to_string()];
        let failed = StorageCleanupResult::all_failed(&paths);
        assert_eq!(failed.removed, 0);
        assert!(!failed.is_complete());
        assert!(StorageCleanupResult { removed: 2, failed: vec![] }.is_complete());
    }
}
