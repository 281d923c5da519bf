//! In-process storage backend.
//!
//! Keeps objects in a map. Used by the integration tests and for running
//! the API without an object store. Failure switches let tests exercise
//! the write-failure and cleanup-failure paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{join_public_url, ObjectStorage, StorageCleanupResult, StorageError};

/// A stored object with the metadata it was written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub cache_control: String,
}

pub struct MemoryStorage {
    public_base_url: String,
    objects: Mutex<HashMap<String, StoredObject>>,
    fail_writes: AtomicBool,
    fail_removals: AtomicBool,
}

impl MemoryStorage {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            public_base_url: public_base_url.into(),
            objects: Mutex::new(HashMap::new()),
            fail_writes: AtomicBool::new(false),
            fail_removals: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `put` fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `remove` fail as a whole.
    pub fn set_fail_removals(&self, fail: bool) {
        self.fail_removals.store(fail, Ordering::SeqCst);
    }

    pub async fn object(&self, path: &str) -> Option<StoredObject> {
        self.objects.lock().await.get(path).cloned()
    }

    pub async fn contains(&self, path: &str) -> bool {
        self.objects.lock().await.contains_key(path)
    }

    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.lock().await.is_empty()
    }

    /// Drop an object behind the gateway's back, simulating external loss.
    pub async fn forget(&self, path: &str) -> bool {
        self.objects.lock().await.remove(path).is_some()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new("http://localhost:9000/templates")
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        cache_control: &str,
    ) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Write {
                path: path.to_string(),
                message: "simulated write failure".into(),
            });
        }
        self.objects.lock().await.insert(
            path.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
                cache_control: cache_control.to_string(),
            },
        );
        Ok(())
    }

    async fn remove(&self, paths: &[String]) -> Result<StorageCleanupResult, StorageError> {
        if self.fail_removals.load(Ordering::SeqCst) {
            return Err(StorageError::Delete("simulated delete failure".into()));
        }
        let mut objects = self.objects.lock().await;
        let mut result = StorageCleanupResult::default();
        for path in paths {
            if objects.remove(path).is_some() {
                result.removed += 1;
            } else {
                result.failed.push(path.clone());
            }
        }
        Ok(result)
    }

    fn public_url(&self, path: &str) -> String {
        join_public_url(&self.public_base_url, path)
    }

    async fn signed_url(&self, path: &str, ttl: Duration) -> Result<String, StorageError> {
        if !self.contains(path).await {
            return Err(StorageError::Presign {
                path: path.to_string(),
                message: "object does not exist".into(),
            });
        }
        Ok(format!("{}?expires_in={}", self.public_url(path), ttl.as_secs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IMMUTABLE_CACHE_CONTROL;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn put_overwrites_and_keeps_metadata() {
        let storage = MemoryStorage::default();
        storage
            .put("a/sm.jpg", vec![1], "image/jpeg", IMMUTABLE_CACHE_CONTROL)
            .await
            .unwrap();
        storage
            .put("a/sm.jpg", vec![2, 3], "image/jpeg", IMMUTABLE_CACHE_CONTROL)
            .await
            .unwrap();

        let object = storage.object("a/sm.jpg").await.unwrap();
        assert_eq!(object.bytes, vec![2, 3]);
        assert_eq!(object.cache_control, IMMUTABLE_CACHE_CONTROL);
        assert_eq!(storage.len().await, 1);
    }

    #[tokio::test]
    async fn remove_reports_missing_objects_as_failed() {
        let storage = MemoryStorage::default();
        storage.put("a/sm.jpg", vec![1], "image/jpeg", "").await.unwrap();

        let result = storage
            .remove(&["a/sm.jpg".to_string(), "a/sm.webp".to_string()])
            .await
            .unwrap();
        assert_eq!(result.removed, 1);
        assert_eq!(result.failed, vec!["a/sm.webp".to_string()]);
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn failure_switches() {
        let storage = MemoryStorage::default();
        storage.set_fail_writes(true);
        assert_matches!(
            storage.put("a/sm.jpg", vec![1], "image/jpeg", "").await,
            Err(StorageError::Write { path, .. }) if path == "a/sm.jpg"
        );

        storage.set_fail_removals(true);
        assert_matches!(
            storage.remove(&["a/sm.jpg".to_string()]).await,
            Err(StorageError::Delete(_))
        );
    }

    #[tokio::test]
    async fn urls() {
        let storage = MemoryStorage::new("https://cdn.test/templates/");
        assert_eq!(
            storage.public_url("abc/md.webp"),
            "https://cdn.test/templates/abc/md.webp"
        );

        assert_matches!(
            storage.signed_url("abc/md.webp", Duration::from_secs(60)).await,
            Err(StorageError::Presign { .. })
        );
        storage.put("abc/md.webp", vec![1], "image/webp", "").await.unwrap();
        assert_eq!(
            storage
                .signed_url("abc/md.webp", Duration::from_secs(60))
                .await
                .unwrap(),
            "https://cdn.test/templates/abc/md.webp?expires_in=60"
        );
    }
}
