//! MongoDB metadata client
//!
//! Keeps file records in the `files` collection with a unique index on
//! `file_id`.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};
use tracing::{debug, info};

use super::FileMetadataStore;
use crate::core::config::MongoDBConfig;
use crate::core::error::Result;
use crate::features::files::models::FileRecord;
use crate::shared::constants::FILES_COLLECTION;

const APP_NAME: &str = "filedrive";

pub struct MongoClient {
    client: Client,
    files: Collection<FileRecord>,
}

impl MongoClient {
    /// Connect with pool settings from config, verify with a ping and
    /// prepare the files collection
    pub async fn connect(config: &MongoDBConfig) -> Result<Self> {
        let mut options = ClientOptions::parse(&config.url).await?;
        options.app_name = Some(APP_NAME.to_string());
        options.max_pool_size = Some(config.max_pool_size);
        options.min_pool_size = Some(config.min_pool_size);
        options.max_idle_time = Some(config.max_idle_time);
        options.server_selection_timeout = Some(config.server_selection_timeout);
        options.connect_timeout = Some(config.connect_timeout);

        let client = Client::with_options(options)?;
        client.database("admin").run_command(doc! { "ping": 1 }).await?;

        let files = client
            .database(&config.database)
            .collection::<FileRecord>(FILES_COLLECTION);

        let mongo = Self { client, files };
        mongo.ensure_indexes().await?;

        info!(
            "MongoDB client initialized for database: {}, collection: {}",
            config.database, FILES_COLLECTION
        );

        Ok(mongo)
    }

    async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "file_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.files.create_index(index).await?;
        debug!("Ensured unique index on {}.file_id", FILES_COLLECTION);
        Ok(())
    }
}

fn by_id(file_id: &str) -> Document {
    doc! { "file_id": file_id }
}

#[async_trait]
impl FileMetadataStore for MongoClient {
    async fn list(&self) -> Result<Vec<FileRecord>> {
        let cursor = self.files.find(doc! {}).await?;
        let records: Vec<FileRecord> = cursor.try_collect().await?;
        debug!("Listed {} file records", records.len());
        Ok(records)
    }

    async fn find(&self, file_id: &str) -> Result<Option<FileRecord>> {
        Ok(self.files.find_one(by_id(file_id)).await?)
    }

    async fn insert(&self, record: &FileRecord) -> Result<()> {
        self.files.insert_one(record).await?;
        debug!("Inserted file record {}", record.file_id);
        Ok(())
    }

    async fn update_name(&self, file_id: &str, name: &str) -> Result<bool> {
        let result = self
            .files
            .update_one(by_id(file_id), doc! { "$set": { "name": name } })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete(&self, file_id: &str) -> Result<bool> {
        let result = self.files.delete_one(by_id(file_id)).await?;
        Ok(result.deleted_count > 0)
    }

    async fn ping(&self) -> Result<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }
}
