use serde::Deserialize;
use std::env;

/// Bucket (or directory) holding every uploaded image
pub const CONTAINER_NAME: &str = "lanternfly-images";

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_S3_REGION: &str = "us-east-1";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub storage_type: StorageType,
    pub container_name: String,
    pub base_url: String,
    pub local_storage_path: Option<String>,
    pub s3_region: String,
    pub s3_endpoint: Option<String>,
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,
    pub server_port: u16,
    pub strict_startup: bool,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub enum StorageType {
    Local,
    S3,
}

impl std::str::FromStr for StorageType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(StorageType::Local),
            "s3" => Ok(StorageType::S3),
            _ => Err(anyhow::anyhow!("Invalid storage type: {}", s)),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_port = match lookup("PORT") {
            Some(port) => port
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid PORT: {}", e))?,
            None => DEFAULT_PORT,
        };

        let strict_startup = match lookup("STORAGE_STRICT_INIT") {
            Some(flag) => parse_flag(&flag)
                .ok_or_else(|| anyhow::anyhow!("Invalid STORAGE_STRICT_INIT: {}", flag))?,
            None => false,
        };

        Ok(Config {
            storage_type: lookup("STORAGE_TYPE")
                .unwrap_or_else(|| "s3".to_string())
                .parse()?,
            container_name: lookup("CONTAINER_NAME")
                .unwrap_or_else(|| CONTAINER_NAME.to_string()),
            base_url: lookup("BASE_URL")
                .unwrap_or_else(|| format!("http://localhost:{}", server_port)),
            local_storage_path: lookup("LOCAL_STORAGE_PATH"),
            s3_region: lookup("S3_REGION").unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
            s3_endpoint: lookup("S3_ENDPOINT"),
            s3_access_key: lookup("S3_ACCESS_KEY"),
            s3_secret_key: lookup("S3_SECRET_KEY"),
            server_port,
            strict_startup,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.container_name.trim().is_empty() {
            return Err(anyhow::anyhow!("CONTAINER_NAME must not be empty"));
        }

        match self.storage_type {
            StorageType::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set for local storage"
                    ));
                }
            }
            StorageType::S3 => {
                if self.s3_access_key.is_none() || self.s3_secret_key.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_ACCESS_KEY and S3_SECRET_KEY must be set for S3 storage"
                    ));
                }
            }
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
