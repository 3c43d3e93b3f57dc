use std::time::Duration;

/// Versioned prefix for the public HTTP API
pub const API_PREFIX: &str = "/api/v1";

/// MongoDB collection holding one document per stored file
pub const FILES_COLLECTION: &str = "files";

/// Allow-list value meaning "any MIME type"
pub const ANY_MIME_TYPE: &str = "*/*";

/// Default allow-list when `ALLOWED_FILE_TYPES` is unset
pub const DEFAULT_ALLOWED_FILE_TYPES: &str = ANY_MIME_TYPE;

/// Upper bound for the configurable upload ceiling (1GB)
pub const MAX_FILE_SIZE_CEILING: usize = 1024 * 1024 * 1024;

/// Extra body allowance for multipart boundaries and headers
pub const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Upper bound on a connection attempt made by the health check
pub const HEALTH_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Maximum length of a stored filename, in bytes
pub const MAX_FILENAME_BYTES: usize = 255;

/// Name used when sanitization leaves nothing behind
pub const UNNAMED_FILE: &str = "unnamed_file";

/// Characters MongoDB does not accept in database names
pub const INVALID_DB_NAME_CHARS: &[char] =
    &[' ', '/', '\\', '.', '"', '$', '*', '<', '>', ':', '|', '?'];
