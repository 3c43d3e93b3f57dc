use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::database::{HealthReport, ServiceHealth};

/// Health of a single backing store
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ServiceHealthDto {
    /// `healthy`, `unhealthy` or `disconnected`
    #[schema(example = "healthy")]
    pub status: String,
    pub error: Option<String>,
}

impl From<ServiceHealth> for ServiceHealthDto {
    fn from(health: ServiceHealth) -> Self {
        Self {
            status: health.status.as_str().to_string(),
            error: health.error,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ServicesHealthDto {
    pub mongodb: ServiceHealthDto,
    pub minio: ServiceHealthDto,
}

/// Response DTO for the health endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponseDto {
    /// `healthy`, `degraded` or `unhealthy`
    #[schema(example = "healthy")]
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub services: ServicesHealthDto,
}

impl HealthResponseDto {
    pub fn from_report(report: HealthReport, version: &str) -> Self {
        Self {
            status: report.status.as_str().to_string(),
            timestamp: Utc::now(),
            version: version.to_string(),
            services: ServicesHealthDto {
                mongodb: report.mongodb.into(),
                minio: report.minio.into(),
            },
        }
    }
}

/// Response DTO for the root endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RootResponseDto {
    pub message: String,
    pub version: String,
    /// Path of the interactive API docs
    pub docs: String,
    /// Path of the health endpoint
    pub health: String,
}
