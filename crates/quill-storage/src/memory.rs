//! In-process storage backend for tests of callers.
//!
//! Besides keeping objects in a map, it can be told to fail puts or deletes so the
//! ingestion and deletion paths can be exercised against a broken blob store.

use crate::keys::{join_url, validate_key};
use crate::traits::{ObjectInfo, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: String,
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, StoredObject>>,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, storage_key: &str) -> bool {
        self.lock().contains_key(storage_key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, storage_key: &str) -> Option<Bytes> {
        self.lock().get(storage_key).map(|o| o.data.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredObject>> {
        // A panicking test thread must not wedge the others.
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put(&self, storage_key: &str, data: Bytes, content_type: &str) -> StorageResult<()> {
        validate_key(storage_key)?;
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed(
                "injected put failure".to_string(),
            ));
        }
        self.lock().insert(
            storage_key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn head(&self, storage_key: &str) -> StorageResult<Option<ObjectInfo>> {
        validate_key(storage_key)?;
        Ok(self.lock().get(storage_key).map(|o| ObjectInfo {
            size: o.data.len() as u64,
            content_type: Some(o.content_type.clone()),
        }))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        validate_key(storage_key)?;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::DeleteFailed(
                "injected delete failure".to_string(),
            ));
        }
        self.lock().remove(storage_key);
        Ok(())
    }

    fn public_url(&self, storage_key: &str) -> String {
        join_url("memory://media", storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
