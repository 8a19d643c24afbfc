pub mod backend;
pub mod local;
#[cfg(test)]
pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;

pub use backend::StorageBackend;
pub use local::LocalStorage;
#[cfg(feature = "s3")]
pub use s3::S3Storage;

use crate::config::{Config, StorageType};
use std::sync::Arc;

/// Factory function to create the appropriate storage backend
pub async fn create_storage(config: &Config) -> anyhow::Result<Arc<dyn StorageBackend>> {
    match config.storage_type {
        StorageType::Local => Ok(Arc::new(LocalStorage::new(config)?)),
        StorageType::S3 => {
            #[cfg(feature = "s3")]
            {
                Ok(Arc::new(S3Storage::connect(config).await?))
            }
            #[cfg(not(feature = "s3"))]
            {
                Err(anyhow::anyhow!("S3 feature not enabled"))
            }
        }
    }
}

/// Provision the container at startup. Failures are logged and tolerated unless `strict` is set.
pub async fn provision(
    storage: &dyn StorageBackend,
    container: &str,
    strict: bool,
) -> anyhow::Result<()> {
    match storage.ensure_container().await {
        Ok(()) => {
            tracing::info!("Container '{}' ready", container);
            Ok(())
        }
        Err(e) if strict => Err(anyhow::anyhow!(
            "Failed to provision container '{}': {}",
            container,
            e
        )),
        Err(e) => {
            tracing::error!("Failed to provision container '{}': {}", container, e);
            Ok(())
        }
    }
}
