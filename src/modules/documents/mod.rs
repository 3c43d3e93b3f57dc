//! Document database module for file metadata
//!
//! Defines the metadata store seam used by the file service and provides the
//! MongoDB implementation.

mod mongo_client;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::features::files::models::FileRecord;

pub use mongo_client::MongoClient;

/// One metadata record per stored file, keyed by `file_id`
#[async_trait]
pub trait FileMetadataStore: Send + Sync {
    async fn list(&self) -> Result<Vec<FileRecord>>;

    async fn find(&self, file_id: &str) -> Result<Option<FileRecord>>;

    async fn insert(&self, record: &FileRecord) -> Result<()>;

    /// Returns `false` when no record matched `file_id`
    async fn update_name(&self, file_id: &str, name: &str) -> Result<bool>;

    /// Returns `false` when no record matched `file_id`
    async fn delete(&self, file_id: &str) -> Result<bool>;

    async fn ping(&self) -> Result<()>;
}
