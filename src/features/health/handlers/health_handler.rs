use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::core::database::{ConnectionManager, OverallStatus};
use crate::features::health::dtos::{HealthResponseDto, RootResponseDto};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Report the state of both backing stores
///
/// Responds 200 only when every store is healthy.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "All stores healthy", body = HealthResponseDto),
        (status = 503, description = "Degraded or unhealthy", body = HealthResponseDto)
    )
)]
pub async fn health_check(
    State(connections): State<Arc<ConnectionManager>>,
) -> (StatusCode, Json<HealthResponseDto>) {
    let report = connections.health_check().await;
    let status = match report.status {
        OverallStatus::Healthy => StatusCode::OK,
        OverallStatus::Degraded | OverallStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(HealthResponseDto::from_report(report, VERSION)))
}

/// Service banner
#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses(
        (status = 200, description = "Service information", body = RootResponseDto)
    )
)]
pub async fn root() -> Json<RootResponseDto> {
    Json(RootResponseDto {
        message: "FileDrive API".to_string(),
        version: VERSION.to_string(),
        docs: "/swagger-ui".to_string(),
        health: "/health".to_string(),
    })
}
