use crate::error::StorageError;
use crate::models::StoredObject;
use async_trait::async_trait;
use axum::body::Bytes;

/// Trait defining the interface for storage backends
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Create the container if needed and make it publicly readable
    async fn ensure_container(&self) -> Result<(), StorageError>;

    /// Store an object, replacing any object with the same name, and return its URL
    async fn upload(
        &self,
        name: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// Public URLs of every object in the container, in store order
    async fn list(&self) -> Result<Vec<String>, StorageError>;

    /// Read an object back with its content type
    async fn fetch(&self, name: &str) -> Result<StoredObject, StorageError>;

    /// Public URL of an object name
    fn object_url(&self, name: &str) -> String;
}
