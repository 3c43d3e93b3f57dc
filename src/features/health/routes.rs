use axum::{routing::get, Router};
use std::sync::Arc;

use crate::core::database::ConnectionManager;
use crate::features::health::handlers::{health_check, root};

/// Create routes for the health feature
pub fn routes(connections: Arc<ConnectionManager>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .with_state(connections)
}
