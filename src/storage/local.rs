use super::backend::StorageBackend;
use crate::config::Config;
use crate::error::StorageError;
use crate::models::StoredObject;
use anyhow::Result;
use async_trait::async_trait;
use axum::body::Bytes;
use std::path::PathBuf;

/// Directory next to the objects holding their content types
const META_DIR: &str = ".meta";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

pub struct LocalStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalStorage {
    pub fn new(config: &Config) -> Result<Self> {
        let storage_path = config
            .local_storage_path
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Local storage path not configured"))?;

        Ok(LocalStorage::at(
            PathBuf::from(storage_path).join(&config.container_name),
            config.base_url.clone(),
        ))
    }

    pub fn at(root: PathBuf, base_url: String) -> Self {
        LocalStorage { root, base_url }
    }

    fn object_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn meta_path(&self, name: &str) -> PathBuf {
        self.root.join(META_DIR).join(name)
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn ensure_container(&self) -> Result<(), StorageError> {
        // Objects are served through /files; there is no access policy to set
        tokio::fs::create_dir_all(self.root.join(META_DIR)).await?;
        Ok(())
    }

    async fn upload(
        &self,
        name: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError> {
        tokio::fs::create_dir_all(self.root.join(META_DIR)).await?;

        tokio::fs::write(self.object_path(name), &bytes).await?;
        tokio::fs::write(self.meta_path(name), content_type).await?;

        tracing::debug!("Stored {} ({} bytes) in {}", name, bytes.len(), self.root.display());
        Ok(self.object_url(name))
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut urls = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                tracing::warn!("Skipping non UTF-8 file name {:?}", file_name);
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            urls.push(self.object_url(name));
        }

        Ok(urls)
    }

    async fn fetch(&self, name: &str) -> Result<StoredObject, StorageError> {
        // Reject anything that would escape the container directory
        if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
            return Err(StorageError::NotFound(name.to_string()));
        }

        let bytes = match tokio::fs::read(self.object_path(name)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let content_type = tokio::fs::read_to_string(self.meta_path(name))
            .await
            .unwrap_or_else(|_| FALLBACK_CONTENT_TYPE.to_string());

        Ok(StoredObject { bytes, content_type })
    }

    fn object_url(&self, name: &str) -> String {
        format!(
            "{}/files/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(name)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(dir: &tempfile::TempDir) -> LocalStorage {
        LocalStorage::at(dir.path().join("images"), "http://localhost:5000/".to_string())
    }

    #[tokio::test]
    async fn test_upload_then_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);
        storage.ensure_container().await.unwrap();

        let url = storage
            .upload("20240102T030405-bug.png", Bytes::from_static(b"\x89PNG\r"), "image/png")
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:5000/files/20240102T030405-bug.png");

        let object = storage.fetch("20240102T030405-bug.png").await.unwrap();
        assert_eq!(object.bytes, b"\x89PNG\r");
        assert_eq!(object.content_type, "image/png");
    }

    #[tokio::test]
    async fn test_upload_overwrites_same_name() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        storage
            .upload("a.png", Bytes::from_static(b"first"), "image/png")
            .await
            .unwrap();
        storage
            .upload("a.png", Bytes::from_static(b"second"), "image/webp")
            .await
            .unwrap();

        let urls = storage.list().await.unwrap();
        assert_eq!(urls.len(), 1);

        let object = storage.fetch("a.png").await.unwrap();
        assert_eq!(object.bytes, b"second");
        assert_eq!(object.content_type, "image/webp");
    }

    #[tokio::test]
    async fn test_list_skips_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);
        storage.ensure_container().await.unwrap();
        assert!(storage.list().await.unwrap().is_empty());

        for name in ["a.png", "b.jpg", "c d.gif"] {
            storage
                .upload(name, Bytes::from_static(b"x"), "image/png")
                .await
                .unwrap();
        }

        let mut urls = storage.list().await.unwrap();
        urls.sort();
        assert_eq!(
            urls,
            vec![
                "http://localhost:5000/files/a.png",
                "http://localhost:5000/files/b.jpg",
                "http://localhost:5000/files/c%20d.gif",
            ]
        );
    }

    #[tokio::test]
    async fn test_list_before_container_exists() {
        let dir = tempfile::tempdir().unwrap();
        assert!(storage(&dir).list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_missing_or_escaping_name() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);
        storage.ensure_container().await.unwrap();

        assert!(matches!(
            storage.fetch("missing.png").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            storage.fetch("../secret").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            storage.fetch(".meta").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
