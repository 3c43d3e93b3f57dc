//! MinIO/S3-compatible storage client
//!
//! Stores raw file bytes in a single bucket, one object per file id.
//!
//! Uses rust-s3 crate for lightweight S3 operations.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info};

use super::ObjectStore;
use crate::core::config::MinIOConfig;
use crate::core::error::{AppError, Result};

/// MinIO/S3-compatible storage client
pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
}

impl MinIOClient {
    /// Build the client without touching the network
    pub fn new(config: &MinIOConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Storage(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Storage(format!("Failed to create MinIO bucket: {}", e)))?;

        // Use path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        Ok(Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Build the client and make sure its bucket is usable
    pub async fn connect(config: &MinIOConfig) -> Result<Self> {
        let client = Self::new(config)?;
        client.ensure_bucket_exists().await?;

        info!(
            "MinIO client initialized for endpoint: {}, bucket: {}",
            client.endpoint,
            client.bucket_name()
        );

        Ok(client)
    }

    /// Ensure the bucket exists, create if not
    pub async fn ensure_bucket_exists(&self) -> Result<()> {
        let exists = self.bucket.exists().await.map_err(|e| {
            AppError::Storage(format!(
                "Failed to check bucket '{}': {}",
                self.bucket.name(),
                e
            ))
        })?;

        if exists {
            debug!("Bucket '{}' already exists", self.bucket.name());
            return Ok(());
        }

        info!("Creating bucket '{}'", self.bucket.name());
        self.create_bucket().await
    }

    /// Create the bucket
    async fn create_bucket(&self) -> Result<()> {
        let bucket_config = BucketConfiguration::default();

        let response = Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            bucket_config,
        )
        .await
        .map_err(|e| {
            AppError::Storage(format!(
                "Failed to create bucket '{}': {}",
                self.bucket.name(),
                e
            ))
        })?;

        if response.success() || is_already_owned(&response.response_text) {
            info!("Bucket '{}' is ready", self.bucket.name());
            Ok(())
        } else {
            Err(AppError::Storage(format!(
                "Failed to create bucket '{}': {} - {}",
                self.bucket.name(),
                response.response_code,
                response.response_text
            )))
        }
    }

    /// Get the bucket name
    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }
}

fn is_already_owned(message: &str) -> bool {
    message.contains("BucketAlreadyOwnedByYou")
        || message.contains("BucketAlreadyExists")
        || message.contains("already own it")
}

fn is_not_found(message: &str) -> bool {
    message.contains("404") || message.contains("NoSuchKey")
}

/// Turn a non-2xx response into a storage error
fn ensure_success(status: u16, action: &str, key: &str) -> Result<()> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(AppError::Storage(format!(
            "Failed to {} '{}': HTTP {}",
            action, key, status
        )))
    }
}

#[async_trait]
impl ObjectStore for MinIOClient {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        let response = self
            .bucket
            .put_object_with_content_type(key, &data, content_type)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload file '{}': {}", key, e)))?;
        ensure_success(response.status_code(), "upload file", key)?;

        debug!("Uploaded file '{}' to bucket '{}'", key, self.bucket.name());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let response = match self.bucket.get_object(key).await {
            Ok(response) => response,
            Err(e) if is_not_found(&e.to_string()) => {
                return Err(AppError::NotFound(format!("Object '{}' not found", key)));
            }
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "Failed to download file '{}': {}",
                    key, e
                )));
            }
        };

        if response.status_code() == 404 {
            return Err(AppError::NotFound(format!("Object '{}' not found", key)));
        }
        ensure_success(response.status_code(), "download file", key)?;

        debug!(
            "Downloaded file '{}' from bucket '{}'",
            key,
            self.bucket.name()
        );
        Ok(response.to_vec())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let response = self
            .bucket
            .delete_object(key)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to delete file '{}': {}", key, e)))?;
        if response.status_code() != 404 {
            ensure_success(response.status_code(), "delete file", key)?;
        }

        debug!(
            "Deleted file '{}' from bucket '{}'",
            key,
            self.bucket.name()
        );
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        match self.bucket.exists().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AppError::Storage(format!(
                "Bucket '{}' does not exist",
                self.bucket.name()
            ))),
            Err(e) => Err(AppError::Storage(format!(
                "MinIO ping failed for '{}': {}",
                self.endpoint, e
            ))),
        }
    }
}
