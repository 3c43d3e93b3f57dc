use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata document for one stored file
///
/// The object bytes live in the object store under `file_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub file_id: String,
    pub name: String,
    pub size: i64,
    pub content_type: String,
    pub extension: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub upload_date: DateTime<Utc>,
}
