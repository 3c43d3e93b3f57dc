use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::features::files::handlers::{
    delete_file, download_file, list_files, rename_file, upload_file,
};
use crate::features::files::services::FileService;
use crate::shared::constants::{API_PREFIX, MULTIPART_OVERHEAD};

/// Create routes for the files feature
pub fn routes(file_service: Arc<FileService>) -> Router {
    let body_limit = file_service.policy().max_file_size + MULTIPART_OVERHEAD;

    let files = Router::new()
        .route("/files", get(list_files))
        .route("/files/", get(list_files))
        .route(
            "/files/upload",
            post(upload_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/files/download/{file_id}", get(download_file))
        .route("/files/{file_id}", put(rename_file).delete(delete_file))
        .with_state(file_service);

    Router::new().nest(API_PREFIX, files)
}
