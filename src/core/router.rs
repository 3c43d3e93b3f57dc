use axum::{
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::core::config::Config;
use crate::core::database::ConnectionManager;
use crate::core::middleware;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::features::files::{routes as files_routes, FileService, UploadPolicy};
use crate::features::health::routes as health_routes;

fn swagger_router(config: &Config) -> Router {
    let mut openapi = ApiDoc::openapi();
    SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    }
    .modify(&mut openapi);

    let swagger =
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi));

    match config.swagger.credentials() {
        Some(credentials) => {
            tracing::info!("Swagger UI basic auth enabled");
            swagger.layer(from_fn_with_state(
                Arc::new(credentials),
                middleware::basic_auth,
            ))
        }
        None => {
            tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
            swagger
        }
    }
}

/// Build the full application router
pub fn create_router(config: &Config, connections: Arc<ConnectionManager>) -> Router {
    let file_service = Arc::new(FileService::new(
        Arc::clone(&connections),
        UploadPolicy::from(&config.upload),
    ));

    Router::new()
        .merge(swagger_router(config))
        .merge(health_routes::routes(connections))
        .merge(files_routes::routes(file_service))
        .fallback(middleware::not_found)
        .layer(CatchPanicLayer::custom(middleware::handle_panic))
        .layer(from_fn(middleware::process_time))
        .layer(middleware::cors_layer(&config.app.cors_allowed_origins))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid))
}
