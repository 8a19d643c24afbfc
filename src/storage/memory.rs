use super::backend::StorageBackend;
use crate::error::StorageError;
use crate::models::StoredObject;
use async_trait::async_trait;
use axum::body::Bytes;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// In-process store standing in for the object store in tests
#[derive(Default)]
pub struct MemoryStorage {
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn ensure_container(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn upload(
        &self,
        name: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError> {
        self.objects.write().await.insert(
            name.to_string(),
            StoredObject {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(self.object_url(name))
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        let objects = self.objects.read().await;
        Ok(objects.keys().map(|name| self.object_url(name)).collect())
    }

    async fn fetch(&self, name: &str) -> Result<StoredObject, StorageError> {
        self.objects
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    fn object_url(&self, name: &str) -> String {
        format!("memory://lanternfly-images/{}", urlencoding::encode(name))
    }
}

/// Store whose every call fails, as an unreachable service would
pub struct FailingStorage;

#[async_trait]
impl StorageBackend for FailingStorage {
    async fn ensure_container(&self) -> Result<(), StorageError> {
        Err(StorageError::backend("connection refused"))
    }

    async fn upload(&self, _: &str, _: Bytes, _: &str) -> Result<String, StorageError> {
        Err(StorageError::backend("connection refused"))
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        Err(StorageError::backend("connection refused"))
    }

    async fn fetch(&self, _: &str) -> Result<StoredObject, StorageError> {
        Err(StorageError::backend("connection refused"))
    }

    fn object_url(&self, name: &str) -> String {
        format!("memory://unreachable/{}", name)
    }
}
