use super::backend::StorageBackend;
use crate::config::Config;
use crate::error::StorageError;
use crate::models::StoredObject;
use anyhow::Result;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    error::DisplayErrorContext,
    primitives::ByteStream,
    types::{BucketLocationConstraint, CreateBucketConfiguration},
    Client,
};
use axum::body::Bytes;

/// Region in which buckets are created without a location constraint
const DEFAULT_REGION: &str = "us-east-1";

pub struct S3Storage {
    client: Client,
    bucket: String,
    region: String,
    endpoint: Option<String>,
}

impl S3Storage {
    /// Build the shared client once from configuration
    pub async fn connect(config: &Config) -> Result<Self> {
        let (access_key, secret_key) = match (&config.s3_access_key, &config.s3_secret_key) {
            (Some(access), Some(secret)) => (access, secret),
            _ => return Err(anyhow::anyhow!("S3 credentials not configured")),
        };

        let mut config_loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.s3_region.clone()))
            .credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "static",
            ));

        if let Some(endpoint) = &config.s3_endpoint {
            config_loader = config_loader.endpoint_url(endpoint);
        }

        let sdk_config = config_loader.load().await;
        let mut s3_config = aws_sdk_s3::config::Builder::from(&sdk_config);

        // S3-compatible services (MinIO, LocalStack) need path-style addressing
        if config.s3_endpoint.is_some() {
            s3_config = s3_config.force_path_style(true);
        }

        Ok(S3Storage::from_client(
            Client::from_conf(s3_config.build()),
            config.container_name.clone(),
            config.s3_region.clone(),
            config.s3_endpoint.clone(),
        ))
    }

    pub fn from_client(
        client: Client,
        bucket: String,
        region: String,
        endpoint: Option<String>,
    ) -> Self {
        S3Storage {
            client,
            bucket,
            region,
            endpoint,
        }
    }

    /// Bucket policy granting anonymous read on every object
    fn public_read_policy(&self) -> String {
        serde_json::json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Sid": "PublicRead",
                "Effect": "Allow",
                "Principal": "*",
                "Action": ["s3:GetObject"],
                "Resource": [format!("arn:aws:s3:::{}/*", self.bucket)],
            }]
        })
        .to_string()
    }

    async fn create_bucket(&self) -> Result<(), StorageError> {
        let mut request = self.client.create_bucket().bucket(&self.bucket);

        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => {
                tracing::info!("Created bucket {}", self.bucket);
                Ok(())
            }
            Err(err) => {
                let err = err.into_service_error();
                if err.is_bucket_already_owned_by_you() {
                    tracing::debug!("Bucket {} already exists", self.bucket);
                    Ok(())
                } else {
                    Err(StorageError::backend(DisplayErrorContext(&err)))
                }
            }
        }
    }
}

#[async_trait]
impl StorageBackend for S3Storage {
    async fn ensure_container(&self) -> Result<(), StorageError> {
        self.create_bucket().await?;

        // New AWS buckets block public policies; not every S3-compatible service has this API
        if let Err(err) = self
            .client
            .delete_public_access_block()
            .bucket(&self.bucket)
            .send()
            .await
        {
            tracing::warn!(
                "Could not remove public access block on {}: {}",
                self.bucket,
                DisplayErrorContext(&err)
            );
        }

        self.client
            .put_bucket_policy()
            .bucket(&self.bucket)
            .policy(self.public_read_policy())
            .send()
            .await
            .map_err(|e| StorageError::backend(DisplayErrorContext(&e)))?;

        Ok(())
    }

    async fn upload(
        &self,
        name: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError> {
        tracing::debug!(
            "S3 PUT: bucket={}, key={}, size={} bytes",
            self.bucket,
            name,
            bytes.len()
        );

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(name)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::backend(DisplayErrorContext(&e)))?;

        Ok(self.object_url(name))
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .into_paginator()
            .send();

        let mut urls = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| StorageError::backend(DisplayErrorContext(&e)))?;
            urls.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .map(|key| self.object_url(key)),
            );
        }

        Ok(urls)
    }

    async fn fetch(&self, name: &str) -> Result<StoredObject, StorageError> {
        let response = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                let err = err.into_service_error();
                if err.is_no_such_key() {
                    return Err(StorageError::NotFound(name.to_string()));
                }
                return Err(StorageError::backend(DisplayErrorContext(&err)));
            }
        };

        let content_type = response
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response
            .body
            .collect()
            .await
            .map_err(StorageError::backend)?
            .into_bytes();

        Ok(StoredObject {
            bytes: bytes.to_vec(),
            content_type,
        })
    }

    fn object_url(&self, name: &str) -> String {
        let key = urlencoding::encode(name);
        if let Some(endpoint) = &self.endpoint {
            // Path-style URL on a custom endpoint
            format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            )
        }
    }
}
