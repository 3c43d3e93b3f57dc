use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::config::UploadConfig;
use crate::core::database::ConnectionManager;
use crate::core::error::{AppError, Result};
use crate::features::files::models::FileRecord;
use crate::shared::validation::{file_extension, is_mime_type_allowed, sanitize_filename};

/// Limits applied to every upload
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_file_size: usize,
    pub allowed_file_types: Vec<String>,
}

impl From<&UploadConfig> for UploadPolicy {
    fn from(config: &UploadConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            allowed_file_types: config.allowed_file_types.clone(),
        }
    }
}

impl UploadPolicy {
    pub fn check_content_type(&self, content_type: Option<&str>) -> Result<()> {
        let content_type = content_type
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .ok_or_else(|| AppError::BadRequest("Content type is required".to_string()))?;

        if !is_mime_type_allowed(content_type, &self.allowed_file_types) {
            return Err(AppError::BadRequest(format!(
                "File type '{}' is not allowed. Allowed types: {}",
                content_type,
                self.allowed_file_types.join(", ")
            )));
        }
        Ok(())
    }

    pub fn check_size(&self, size: usize) -> Result<()> {
        if size > self.max_file_size {
            return Err(AppError::PayloadTooLarge(format!(
                "File too large. Maximum size is {} bytes ({} MB)",
                self.max_file_size,
                self.max_file_size / 1024 / 1024
            )));
        }
        Ok(())
    }
}

/// BSON dates only carry milliseconds
fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::<Utc>::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// Service for file operations
pub struct FileService {
    connections: Arc<ConnectionManager>,
    policy: UploadPolicy,
}

impl FileService {
    pub fn new(connections: Arc<ConnectionManager>, policy: UploadPolicy) -> Self {
        Self {
            connections,
            policy,
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// All stored file records
    pub async fn list_files(&self) -> Result<Vec<FileRecord>> {
        let files = self.connections.metadata_store().await?.list().await?;
        debug!("Listed {} file(s)", files.len());
        Ok(files)
    }

    /// Get a single file record
    pub async fn get_file(&self, file_id: &str) -> Result<FileRecord> {
        self.connections
            .metadata_store()
            .await?
            .find(file_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File '{}' not found", file_id)))
    }

    /// Store a new file and its metadata record
    ///
    /// # Arguments
    /// * `filename` - Client-supplied name, sanitized before it is stored
    /// * `content_type` - MIME type, checked against the allow-list
    /// * `data` - The file content
    ///
    /// The object is written first. If the record cannot be inserted the
    /// object is removed again.
    pub async fn upload_file(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<FileRecord> {
        if filename.is_empty() {
            return Err(AppError::BadRequest("Filename is required".to_string()));
        }
        self.policy.check_content_type(Some(content_type))?;
        self.policy.check_size(data.len())?;

        let metadata = self.connections.metadata_store().await?;
        let objects = self.connections.object_store().await?;

        let name = sanitize_filename(filename);
        let record = FileRecord {
            file_id: Uuid::new_v4().to_string(),
            extension: file_extension(&name).to_string(),
            size: data.len() as i64,
            content_type: content_type.to_string(),
            name,
            upload_date: now_millis(),
        };

        objects.put(&record.file_id, data, content_type).await?;
        debug!("Object written for file {}", record.file_id);

        if let Err(e) = metadata.insert(&record).await {
            if let Err(cleanup) = objects.delete(&record.file_id).await {
                warn!(
                    "Failed to remove orphaned object {}: {}",
                    record.file_id, cleanup
                );
            }
            return Err(e);
        }

        info!(
            "File uploaded: id={}, name={}, size={}, content_type={}",
            record.file_id, record.name, record.size, record.content_type
        );
        Ok(record)
    }

    /// Fetch a file's record and bytes
    pub async fn download_file(&self, file_id: &str) -> Result<(FileRecord, Vec<u8>)> {
        let record = self.get_file(file_id).await?;
        let data = match self.connections.object_store().await?.get(file_id).await {
            Ok(data) => data,
            Err(AppError::NotFound(_)) => {
                warn!("File {} has a record but no stored object", file_id);
                return Err(AppError::NotFound(format!(
                    "File content for '{}' not found",
                    file_id
                )));
            }
            Err(e) => return Err(e),
        };

        debug!("File downloaded: id={}, bytes={}", file_id, data.len());
        Ok((record, data))
    }

    /// Change a file's display name. Returns the stored (sanitized) name.
    pub async fn rename_file(&self, file_id: &str, new_name: &str) -> Result<String> {
        if new_name.trim().is_empty() {
            return Err(AppError::BadRequest("New file name is required".to_string()));
        }

        let name = sanitize_filename(new_name);
        let updated = self
            .connections
            .metadata_store()
            .await?
            .update_name(file_id, &name)
            .await?;
        if !updated {
            return Err(AppError::NotFound(format!("File '{}' not found", file_id)));
        }

        info!("File renamed: id={}, name={}", file_id, name);
        Ok(name)
    }

    /// Remove a file's object and then its record
    pub async fn delete_file(&self, file_id: &str) -> Result<()> {
        let metadata = self.connections.metadata_store().await?;
        if metadata.find(file_id).await?.is_none() {
            return Err(AppError::NotFound(format!("File '{}' not found", file_id)));
        }

        self.connections
            .object_store()
            .await?
            .delete(file_id)
            .await?;

        if !metadata.delete(file_id).await? {
            return Err(AppError::NotFound(format!("File '{}' not found", file_id)));
        }

        info!("File deleted: id={}", file_id);
        Ok(())
    }
}
