use utoipa::{Modify, OpenApi};

use crate::features::files::{dtos as files_dtos, handlers as files_handlers};
use crate::features::health::{dtos as health_dtos, handlers as health_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health_handlers::root,
        health_handlers::health_check,
        // Files
        files_handlers::list_files,
        files_handlers::upload_file,
        files_handlers::download_file,
        files_handlers::rename_file,
        files_handlers::delete_file,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Health
            health_dtos::RootResponseDto,
            health_dtos::HealthResponseDto,
            health_dtos::ServicesHealthDto,
            health_dtos::ServiceHealthDto,
            // Files
            files_dtos::UploadFileDto,
            files_dtos::FileResponseDto,
            files_dtos::RenameFileResponseDto,
            files_dtos::DeleteFileResponseDto,
            ApiResponse<Vec<files_dtos::FileResponseDto>>,
            ApiResponse<files_dtos::FileResponseDto>,
            ApiResponse<files_dtos::RenameFileResponseDto>,
            ApiResponse<files_dtos::DeleteFileResponseDto>,
        )
    ),
    tags(
        (name = "health", description = "Service banner and store health"),
        (name = "files", description = "File upload, download and management"),
    ),
    info(
        title = "FileDrive API",
        version = "0.1.0",
        description = "HTTP file storage backed by MongoDB and MinIO",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
