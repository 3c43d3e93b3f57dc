use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::features::files::models::FileRecord;

/// Upload file request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler reads the body through `AppMultipart`.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadFileDto {
    /// The file to upload
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// Response DTO for file metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FileResponseDto {
    /// Unique file identifier (UUID)
    pub file_id: String,
    /// Sanitized display name
    pub name: String,
    /// Size of the file in bytes
    pub size: i64,
    /// MIME type of the file
    pub content_type: String,
    /// Extension derived from the name, including the dot
    #[schema(example = ".pdf")]
    pub extension: String,
    /// Timestamp when the file was uploaded
    pub upload_date: DateTime<Utc>,
}

impl From<FileRecord> for FileResponseDto {
    fn from(record: FileRecord) -> Self {
        Self {
            file_id: record.file_id,
            name: record.name,
            size: record.size,
            content_type: record.content_type,
            extension: record.extension,
            upload_date: record.upload_date,
        }
    }
}

/// Query parameters for renaming a file
#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RenameFileQuery {
    /// New file name
    #[validate(length(min = 1, message = "New file name is required"))]
    pub name: String,
}

/// Response DTO for rename operations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RenameFileResponseDto {
    pub file_id: String,
    /// The stored (sanitized) name
    pub name: String,
}

/// Response DTO for delete operations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteFileResponseDto {
    /// Confirmation that the file was deleted
    pub deleted: bool,
}
