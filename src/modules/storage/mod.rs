//! Storage module for file bytes
//!
//! Defines the object store seam used by the file service and provides the
//! MinIO/S3-compatible implementation.

mod minio_client;

use async_trait::async_trait;

use crate::core::error::Result;

pub use minio_client::MinIOClient;

/// Binary object storage keyed by file id
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `key`, replacing any existing object
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()>;

    /// Fetch the object bytes, `AppError::NotFound` when the key is absent
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Remove the object; removing a missing key is not an error
    async fn delete(&self, key: &str) -> Result<()>;

    /// Lightweight reachability test for the health endpoint
    async fn ping(&self) -> Result<()>;
}
