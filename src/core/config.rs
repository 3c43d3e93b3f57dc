use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_ALLOWED_FILE_TYPES, INVALID_DB_NAME_CHARS, MAX_FILE_SIZE_CEILING,
};

/// Typed configuration failure, raised once at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Source of raw configuration values (the process environment in production).
pub trait ConfigSource {
    fn get(&self, key: &str) -> Option<String>;
}

impl<F> ConfigSource for F
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        self(key)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub mongodb: MongoDBConfig,
    pub retry: RetryConfig,
    pub minio: MinIOConfig,
    pub upload: UploadConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MongoDBConfig {
    pub url: String,
    pub database: String,
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub max_idle_time: Duration,
    pub server_selection_timeout: Duration,
    pub connect_timeout: Duration,
}

/// Startup connection retry policy
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub enabled: bool,
    pub max_retries: u32,
    pub initial_delay: Duration,
}

/// MinIO/S3 storage configuration for file bytes
#[derive(Debug, Clone)]
pub struct MinIOConfig {
    /// Endpoint URL including scheme
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_file_size: usize,
    pub allowed_file_types: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

fn value(source: &dyn ConfigSource, key: &str) -> Option<String> {
    source
        .get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(source: &dyn ConfigSource, key: &'static str) -> ConfigResult<String> {
    value(source, key).ok_or(ConfigError::Missing(key))
}

fn parse_or<T>(source: &dyn ConfigSource, key: &'static str, default: T) -> ConfigResult<T>
where
    T: std::str::FromStr,
{
    match value(source, key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::invalid(key, format!("'{}' must be a valid number", raw))),
        None => Ok(default),
    }
}

fn in_range<T>(key: &'static str, v: T, min: T, max: T) -> ConfigResult<T>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if v < min || v > max {
        return Err(ConfigError::invalid(
            key,
            format!("must be between {} and {}, got {}", min, max, v),
        ));
    }
    Ok(v)
}

fn parse_bool(source: &dyn ConfigSource, key: &'static str, default: bool) -> ConfigResult<bool> {
    match value(source, key) {
        Some(raw) => match raw.to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::invalid(
                key,
                format!("'{}' must be a boolean", raw),
            )),
        },
        None => Ok(default),
    }
}

fn comma_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    pub fn from_env() -> ConfigResult<Self> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Self::from_source(&|key: &str| env::var(key).ok())
    }

    pub fn from_source(source: &dyn ConfigSource) -> ConfigResult<Self> {
        Ok(Config {
            app: AppConfig::from_source(source)?,
            mongodb: MongoDBConfig::from_source(source)?,
            retry: RetryConfig::from_source(source)?,
            minio: MinIOConfig::from_source(source)?,
            upload: UploadConfig::from_source(source)?,
            swagger: SwaggerConfig::from_source(source)?,
        })
    }
}

impl AppConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8000;
    const DEFAULT_CORS_ALLOWED_ORIGINS: &'static str = "http://localhost:3000";

    pub fn from_source(source: &dyn ConfigSource) -> ConfigResult<Self> {
        let host = value(source, "HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let port = in_range("PORT", parse_or(source, "PORT", Self::DEFAULT_PORT)?, 1, u16::MAX)?;

        let cors_allowed_origins = comma_list(
            &source
                .get("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|| Self::DEFAULT_CORS_ALLOWED_ORIGINS.to_string()),
        );
        if cors_allowed_origins.is_empty() {
            return Err(ConfigError::invalid(
                "CORS_ALLOWED_ORIGINS",
                "at least one CORS origin must be specified",
            ));
        }

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl MongoDBConfig {
    const DEFAULT_MAX_POOL_SIZE: u32 = 10;
    const DEFAULT_MIN_POOL_SIZE: u32 = 1;
    const DEFAULT_MAX_IDLE_TIME_MS: u64 = 30_000;
    const DEFAULT_SERVER_SELECTION_TIMEOUT_MS: u64 = 5_000;
    const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

    pub fn from_source(source: &dyn ConfigSource) -> ConfigResult<Self> {
        let url = required(source, "MONGODB_URL")?;
        if !(url.starts_with("mongodb://") || url.starts_with("mongodb+srv://")) {
            return Err(ConfigError::invalid(
                "MONGODB_URL",
                "must start with 'mongodb://' or 'mongodb+srv://'",
            ));
        }

        let database = required(source, "MONGODB_DATABASE")?;
        if let Some(c) = database.chars().find(|c| INVALID_DB_NAME_CHARS.contains(c)) {
            return Err(ConfigError::invalid(
                "MONGODB_DATABASE",
                format!("contains invalid character '{}'", c),
            ));
        }

        let max_pool_size = in_range(
            "MONGODB_MAX_POOL_SIZE",
            parse_or(source, "MONGODB_MAX_POOL_SIZE", Self::DEFAULT_MAX_POOL_SIZE)?,
            1,
            100,
        )?;
        let min_pool_size = in_range(
            "MONGODB_MIN_POOL_SIZE",
            parse_or(source, "MONGODB_MIN_POOL_SIZE", Self::DEFAULT_MIN_POOL_SIZE)?,
            0,
            50,
        )?;
        if min_pool_size > max_pool_size {
            return Err(ConfigError::invalid(
                "MONGODB_MIN_POOL_SIZE",
                "must not exceed MONGODB_MAX_POOL_SIZE",
            ));
        }

        let max_idle_time_ms = in_range(
            "MONGODB_MAX_IDLE_TIME_MS",
            parse_or(source, "MONGODB_MAX_IDLE_TIME_MS", Self::DEFAULT_MAX_IDLE_TIME_MS)?,
            1_000,
            300_000,
        )?;
        let server_selection_timeout_ms = in_range(
            "MONGODB_SERVER_SELECTION_TIMEOUT_MS",
            parse_or(
                source,
                "MONGODB_SERVER_SELECTION_TIMEOUT_MS",
                Self::DEFAULT_SERVER_SELECTION_TIMEOUT_MS,
            )?,
            1_000,
            30_000,
        )?;
        let connect_timeout_ms = in_range(
            "MONGODB_CONNECT_TIMEOUT_MS",
            parse_or(
                source,
                "MONGODB_CONNECT_TIMEOUT_MS",
                Self::DEFAULT_CONNECT_TIMEOUT_MS,
            )?,
            1_000,
            60_000,
        )?;

        Ok(Self {
            url,
            database,
            max_pool_size,
            min_pool_size,
            max_idle_time: Duration::from_millis(max_idle_time_ms),
            server_selection_timeout: Duration::from_millis(server_selection_timeout_ms),
            connect_timeout: Duration::from_millis(connect_timeout_ms),
        })
    }
}

impl RetryConfig {
    const DEFAULT_MAX_RETRIES: u32 = 3;
    const DEFAULT_RETRY_DELAY_SECS: f64 = 1.0;

    pub fn from_source(source: &dyn ConfigSource) -> ConfigResult<Self> {
        let enabled = parse_bool(source, "DB_RETRY_ENABLED", true)?;
        let max_retries = in_range(
            "DB_MAX_RETRIES",
            parse_or(source, "DB_MAX_RETRIES", Self::DEFAULT_MAX_RETRIES)?,
            1,
            10,
        )?;
        let delay_secs = in_range(
            "DB_RETRY_DELAY_SECS",
            parse_or(source, "DB_RETRY_DELAY_SECS", Self::DEFAULT_RETRY_DELAY_SECS)?,
            0.1,
            10.0,
        )?;

        Ok(Self {
            enabled,
            max_retries,
            initial_delay: Duration::from_secs_f64(delay_secs),
        })
    }
}

impl MinIOConfig {
    const DEFAULT_REGION: &'static str = "us-east-1";
    const MIN_ACCESS_KEY_LENGTH: usize = 3;
    const MIN_BUCKET_NAME_LENGTH: usize = 3;
    const MAX_BUCKET_NAME_LENGTH: usize = 63;

    pub fn from_source(source: &dyn ConfigSource) -> ConfigResult<Self> {
        let secure = parse_bool(source, "MINIO_SECURE", false)?;
        let endpoint = normalize_endpoint(&required(source, "MINIO_ENDPOINT")?, secure);

        let access_key = required(source, "MINIO_ACCESS_KEY")?;
        if access_key.chars().count() < Self::MIN_ACCESS_KEY_LENGTH {
            return Err(ConfigError::invalid(
                "MINIO_ACCESS_KEY",
                format!(
                    "must be at least {} characters long",
                    Self::MIN_ACCESS_KEY_LENGTH
                ),
            ));
        }

        let secret_key = required(source, "MINIO_SECRET_KEY")?;

        let bucket = required(source, "MINIO_BUCKET")?;
        validate_bucket_name(&bucket)?;

        let region =
            value(source, "MINIO_REGION").unwrap_or_else(|| Self::DEFAULT_REGION.to_string());

        Ok(Self {
            endpoint,
            access_key,
            secret_key,
            bucket,
            region,
        })
    }
}

/// Prefix a bare `host:port` endpoint with the scheme implied by `secure`
fn normalize_endpoint(raw: &str, secure: bool) -> String {
    let trimmed = raw.trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else if secure {
        format!("https://{}", trimmed)
    } else {
        format!("http://{}", trimmed)
    }
}

fn validate_bucket_name(bucket: &str) -> ConfigResult<()> {
    let len = bucket.len();
    if len < MinIOConfig::MIN_BUCKET_NAME_LENGTH || len > MinIOConfig::MAX_BUCKET_NAME_LENGTH {
        return Err(ConfigError::invalid(
            "MINIO_BUCKET",
            format!(
                "must be between {} and {} characters",
                MinIOConfig::MIN_BUCKET_NAME_LENGTH,
                MinIOConfig::MAX_BUCKET_NAME_LENGTH
            ),
        ));
    }

    let starts_ok = bucket.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
    let ends_ok = bucket.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());
    if !starts_ok || !ends_ok {
        return Err(ConfigError::invalid(
            "MINIO_BUCKET",
            "must start and end with alphanumeric characters",
        ));
    }
    Ok(())
}

impl UploadConfig {
    const DEFAULT_MAX_FILE_SIZE: usize = 100 * 1024 * 1024; // 100MB

    pub fn from_source(source: &dyn ConfigSource) -> ConfigResult<Self> {
        let max_file_size = in_range(
            "MAX_FILE_SIZE",
            parse_or(source, "MAX_FILE_SIZE", Self::DEFAULT_MAX_FILE_SIZE)?,
            1,
            MAX_FILE_SIZE_CEILING,
        )?;

        let raw = value(source, "ALLOWED_FILE_TYPES")
            .unwrap_or_else(|| DEFAULT_ALLOWED_FILE_TYPES.to_string());
        let allowed_file_types = comma_list(&raw);
        if allowed_file_types.is_empty() {
            return Err(ConfigError::invalid(
                "ALLOWED_FILE_TYPES",
                "at least one MIME type must be allowed",
            ));
        }

        Ok(Self {
            max_file_size,
            allowed_file_types,
        })
    }
}

impl SwaggerConfig {
    pub fn from_source(source: &dyn ConfigSource) -> ConfigResult<Self> {
        // Only use credentials if they are non-empty
        let username = value(source, "SWAGGER_USERNAME");
        let password = value(source, "SWAGGER_PASSWORD");
        let title = value(source, "SWAGGER_TITLE").unwrap_or_else(|| "FileDrive API".to_string());
        let version = value(source, "SWAGGER_VERSION").unwrap_or_else(|| "1.0.0".to_string());
        let description = value(source, "SWAGGER_DESCRIPTION")
            .unwrap_or_else(|| "File storage and management API".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}
