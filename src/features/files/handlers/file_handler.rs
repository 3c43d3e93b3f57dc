use axum::{
    extract::{multipart::MultipartError, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

use crate::core::error::AppError;
use crate::core::extractor::{AppMultipart, AppQuery};
use crate::features::files::dtos::{
    DeleteFileResponseDto, FileResponseDto, RenameFileQuery, RenameFileResponseDto, UploadFileDto,
};
use crate::features::files::services::FileService;
use crate::shared::types::{ApiResponse, Meta};

fn multipart_error(e: MultipartError) -> AppError {
    debug!("Failed to read multipart data: {}", e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("Request body too large: {}", e.body_text()))
    } else {
        AppError::BadRequest(format!("Failed to read multipart data: {}", e.body_text()))
    }
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8 name
fn content_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(name)
    )
}

fn header_value(value: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::Internal(format!("Invalid header value '{}': {}", value, e)))
}

/// List all files
#[utoipa::path(
    get,
    path = "/api/v1/files",
    tag = "files",
    responses(
        (status = 200, description = "All stored files", body = ApiResponse<Vec<FileResponseDto>>),
        (status = 500, description = "Store unavailable or failed")
    )
)]
pub async fn list_files(
    State(service): State<Arc<FileService>>,
) -> Result<Json<ApiResponse<Vec<FileResponseDto>>>, AppError> {
    let files: Vec<FileResponseDto> = service
        .list_files()
        .await?
        .into_iter()
        .map(FileResponseDto::from)
        .collect();
    let total = files.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(files),
        None,
        Some(Meta { total }),
    )))
}

/// Upload a file
///
/// Accepts multipart/form-data with a single `file` part. Other parts are
/// ignored.
#[utoipa::path(
    post,
    path = "/api/v1/files/upload",
    tag = "files",
    request_body(
        content = UploadFileDto,
        content_type = "multipart/form-data",
        description = "File upload form",
    ),
    responses(
        (status = 200, description = "File uploaded successfully", body = ApiResponse<FileResponseDto>),
        (status = 400, description = "Missing file, missing filename or disallowed type"),
        (status = 413, description = "File too large"),
        (status = 500, description = "Store unavailable or failed")
    )
)]
pub async fn upload_file(
    State(service): State<Arc<FileService>>,
    AppMultipart(mut multipart): AppMultipart,
) -> Result<Json<ApiResponse<FileResponseDto>>, AppError> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            debug!("Ignoring unknown field: {:?}", field.name());
            continue;
        }

        let file_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("Filename is required".to_string()))?;
        let content_type = field.content_type().map(str::to_string);
        service.policy().check_content_type(content_type.as_deref())?;
        let content_type = content_type.unwrap_or_default();

        let mut data = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            service.policy().check_size(data.len() + chunk.len())?;
            data.extend_from_slice(&chunk);
        }

        let record = service.upload_file(&file_name, &content_type, data).await?;

        return Ok(Json(ApiResponse::success(
            Some(FileResponseDto::from(record)),
            Some("File uploaded successfully".to_string()),
            None,
        )));
    }

    Err(AppError::BadRequest("File is required".to_string()))
}

/// Download a file's content
#[utoipa::path(
    get,
    path = "/api/v1/files/download/{file_id}",
    tag = "files",
    params(
        ("file_id" = String, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 404, description = "File not found"),
        (status = 500, description = "Store unavailable or failed")
    )
)]
pub async fn download_file(
    State(service): State<Arc<FileService>>,
    Path(file_id): Path<String>,
) -> Result<Response, AppError> {
    let (record, data) = service.download_file(&file_id).await?;

    let headers = [
        (header::CONTENT_TYPE, header_value(&record.content_type)?),
        (
            header::CONTENT_DISPOSITION,
            header_value(&content_disposition(&record.name))?,
        ),
        (header::CONTENT_LENGTH, HeaderValue::from(data.len())),
    ];

    Ok((headers, data).into_response())
}

/// Rename a file
#[utoipa::path(
    put,
    path = "/api/v1/files/{file_id}",
    tag = "files",
    params(
        ("file_id" = String, Path, description = "File ID"),
        RenameFileQuery
    ),
    responses(
        (status = 200, description = "File name updated successfully", body = ApiResponse<RenameFileResponseDto>),
        (status = 400, description = "Missing or empty name"),
        (status = 404, description = "File not found"),
        (status = 500, description = "Store unavailable or failed")
    )
)]
pub async fn rename_file(
    State(service): State<Arc<FileService>>,
    Path(file_id): Path<String>,
    AppQuery(query): AppQuery<RenameFileQuery>,
) -> Result<Json<ApiResponse<RenameFileResponseDto>>, AppError> {
    query
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let name = service.rename_file(&file_id, &query.name).await?;

    Ok(Json(ApiResponse::success(
        Some(RenameFileResponseDto { file_id, name }),
        Some("File name updated successfully".to_string()),
        None,
    )))
}

/// Delete a file
#[utoipa::path(
    delete,
    path = "/api/v1/files/{file_id}",
    tag = "files",
    params(
        ("file_id" = String, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File deleted successfully", body = ApiResponse<DeleteFileResponseDto>),
        (status = 404, description = "File not found"),
        (status = 500, description = "Store unavailable or failed")
    )
)]
pub async fn delete_file(
    State(service): State<Arc<FileService>>,
    Path(file_id): Path<String>,
) -> Result<Json<ApiResponse<DeleteFileResponseDto>>, AppError> {
    service.delete_file(&file_id).await?;

    Ok(Json(ApiResponse::success(
        Some(DeleteFileResponseDto { deleted: true }),
        Some("File deleted successfully".to_string()),
        None,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::files::routes;
    use crate::shared::test_helpers::{file_service, upload_config, TestConnector};
    use crate::shared::validation::sanitize_filename;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use fake::faker::filesystem::en::FileName;
    use fake::Fake;
    use serde_json::Value;

    const MB: usize = 1024 * 1024;

    async fn server(max_file_size: usize, allowed: &[&str]) -> (TestServer, Arc<TestConnector>) {
        let (service, connector) = file_service(&upload_config(max_file_size, allowed)).await;
        let server = TestServer::new(routes(service)).unwrap();
        (server, connector)
    }

    fn file_form(name: &str, content_type: &str, data: &[u8]) -> MultipartForm {
        MultipartForm::new().add_part(
            "file",
            Part::bytes(data.to_vec())
                .file_name(name)
                .mime_type(content_type),
        )
    }

    async fn upload(server: &TestServer, name: &str, content_type: &str, data: &[u8]) -> Value {
        let response = server
            .post("/api/v1/files/upload")
            .multipart(file_form(name, content_type, data))
            .await;
        response.assert_status_ok();
        response.json::<Value>()
    }

    #[test]
    fn test_content_disposition_encodes_unicode() {
        assert_eq!(
            content_disposition("résumé 1.pdf"),
            "attachment; filename=\"r_sum_ 1.pdf\"; filename*=UTF-8''r%C3%A9sum%C3%A9%201.pdf"
        );
    }

    #[tokio::test]
    async fn test_upload_then_download_is_byte_identical() {
        let (server, _) = server(MB, &["*/*"]).await;
        let data: Vec<u8> = (0..=255).collect();

        let body = upload(&server, "report.pdf", "application/pdf", &data).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "File uploaded successfully");
        assert_eq!(body["data"]["name"], "report.pdf");
        assert_eq!(body["data"]["extension"], ".pdf");
        assert_eq!(body["data"]["size"], 256);
        let file_id = body["data"]["file_id"].as_str().unwrap().to_string();

        let response = server
            .get(&format!("/api/v1/files/download/{}", file_id))
            .await;
        response.assert_status_ok();
        assert_eq!(response.as_bytes().to_vec(), data);
        assert_eq!(response.header(header::CONTENT_TYPE), "application/pdf");
        assert_eq!(response.header(header::CONTENT_LENGTH), "256");
        assert!(response
            .header(header::CONTENT_DISPOSITION)
            .to_str()
            .unwrap()
            .starts_with("attachment; filename=\"report.pdf\""));
    }

    #[tokio::test]
    async fn test_list_reports_total() {
        let (server, _) = server(MB, &["*/*"]).await;
        let name: String = FileName().fake();

        upload(&server, &name, "text/plain", b"one").await;
        upload(&server, "two.txt", "text/plain", b"two").await;

        for path in ["/api/v1/files", "/api/v1/files/"] {
            let response = server.get(path).await;
            response.assert_status_ok();
            let body = response.json::<Value>();
            assert_eq!(body["meta"]["total"], 2);
            let names: Vec<&str> = body["data"]
                .as_array()
                .unwrap()
                .iter()
                .filter_map(|f| f["name"].as_str())
                .collect();
            assert!(names.contains(&sanitize_filename(&name).as_str()));
            assert!(names.contains(&"two.txt"));
        }
    }

    #[tokio::test]
    async fn test_upload_stores_sanitized_name() {
        let (server, _) = server(MB, &["*/*"]).await;

        let body = upload(&server, "a<b>c.txt", "text/plain", b"x").await;

        assert_eq!(body["data"]["name"], "a_b_c.txt");
    }

    #[tokio::test]
    async fn test_upload_without_file_part() {
        let (server, connector) = server(MB, &["*/*"]).await;

        let form = MultipartForm::new().add_text("comment", "no file here");
        let response = server.post("/api/v1/files/upload").multipart(form).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["message"], "File is required");
        assert_eq!(connector.objects.len(), 0);
    }

    #[tokio::test]
    async fn test_upload_oversize_is_rejected_without_write() {
        let (server, connector) = server(16, &["*/*"]).await;

        let response = server
            .post("/api/v1/files/upload")
            .multipart(file_form("big.bin", "application/octet-stream", &[7u8; 64]))
            .await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(connector.objects.len(), 0);
        assert_eq!(connector.metadata.len(), 0);
    }

    #[tokio::test]
    async fn test_upload_past_body_limit_is_rejected_without_write() {
        let (server, connector) = server(16, &["*/*"]).await;

        let form = MultipartForm::new()
            .add_text("comment", "x".repeat(2 * MB))
            .add_part(
                "file",
                Part::bytes(b"tiny".to_vec())
                    .file_name("tiny.txt")
                    .mime_type("text/plain"),
            );
        let response = server.post("/api/v1/files/upload").multipart(form).await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        let body = response.json::<Value>();
        assert_eq!(body["success"], false);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("Request body too large"));
        assert_eq!(connector.objects.len(), 0);
        assert_eq!(connector.metadata.len(), 0);
    }

    #[tokio::test]
    async fn test_upload_non_multipart_body_uses_envelope() {
        let (server, connector) = server(MB, &["*/*"]).await;

        let response = server.post("/api/v1/files/upload").text("hello").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body = response.json::<Value>();
        assert_eq!(body["success"], false);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("Expected a multipart/form-data request"));
        assert_eq!(connector.objects.len(), 0);
    }

    #[tokio::test]
    async fn test_upload_disallowed_type_is_rejected_without_write() {
        let (server, connector) = server(MB, &["image/*"]).await;

        let response = server
            .post("/api/v1/files/upload")
            .multipart(file_form("script.sh", "text/x-shellscript", b"echo"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(connector.objects.len(), 0);

        let body = upload(&server, "photo.png", "image/png", b"png").await;
        assert_eq!(body["data"]["content_type"], "image/png");
    }

    #[tokio::test]
    async fn test_rename_changes_only_name() {
        let (server, _) = server(MB, &["*/*"]).await;
        let body = upload(&server, "draft.txt", "text/plain", b"content").await;
        let file_id = body["data"]["file_id"].as_str().unwrap().to_string();

        let response = server
            .put(&format!("/api/v1/files/{}", file_id))
            .add_query_param("name", "final?.txt")
            .await;
        response.assert_status_ok();
        let renamed = response.json::<Value>();
        assert_eq!(renamed["message"], "File name updated successfully");
        assert_eq!(renamed["data"]["file_id"], file_id.as_str());
        assert_eq!(renamed["data"]["name"], "final_.txt");

        let listed = server.get("/api/v1/files").await.json::<Value>();
        let record = &listed["data"][0];
        assert_eq!(record["name"], "final_.txt");
        assert_eq!(record["size"], body["data"]["size"]);
        assert_eq!(record["upload_date"], body["data"]["upload_date"]);

        let download = server
            .get(&format!("/api/v1/files/download/{}", file_id))
            .await;
        assert_eq!(download.as_bytes().to_vec(), b"content".to_vec());
    }

    #[tokio::test]
    async fn test_rename_rejects_empty_name() {
        let (server, _) = server(MB, &["*/*"]).await;

        let empty = server
            .put("/api/v1/files/unknown")
            .add_query_param("name", "")
            .await;
        empty.assert_status(StatusCode::BAD_REQUEST);

        let missing = server.put("/api/v1/files/unknown").await;
        missing.assert_status(StatusCode::BAD_REQUEST);

        let unknown = server
            .put("/api/v1/files/unknown")
            .add_query_param("name", "x.txt")
            .await;
        unknown.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_then_everything_is_not_found() {
        let (server, connector) = server(MB, &["*/*"]).await;
        let body = upload(&server, "gone.txt", "text/plain", b"bye").await;
        let file_id = body["data"]["file_id"].as_str().unwrap().to_string();

        let response = server.delete(&format!("/api/v1/files/{}", file_id)).await;
        response.assert_status_ok();
        let deleted = response.json::<Value>();
        assert_eq!(deleted["data"]["deleted"], true);
        assert_eq!(deleted["message"], "File deleted successfully");
        assert!(!connector.objects.contains(&file_id));

        server
            .get(&format!("/api/v1/files/download/{}", file_id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .delete(&format!("/api/v1/files/{}", file_id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .put(&format!("/api/v1/files/{}", file_id))
            .add_query_param("name", "again.txt")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_download_storage_failure_is_500() {
        let (server, connector) = server(MB, &["*/*"]).await;
        let body = upload(&server, "a.txt", "text/plain", b"x").await;
        let file_id = body["data"]["file_id"].as_str().unwrap().to_string();
        connector.objects.set_fail_gets(true);

        let response = server
            .get(&format!("/api/v1/files/download/{}", file_id))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.json::<Value>();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Storage error occurred");
    }

    #[tokio::test]
    async fn test_delete_storage_failure_keeps_record() {
        let (server, connector) = server(MB, &["*/*"]).await;
        let body = upload(&server, "keep.txt", "text/plain", b"x").await;
        let file_id = body["data"]["file_id"].as_str().unwrap().to_string();
        connector.objects.set_fail_deletes(true);

        let response = server.delete(&format!("/api/v1/files/{}", file_id)).await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.json::<Value>()["message"], "Storage error occurred");
        assert!(connector.metadata.get(&file_id).is_some());

        connector.objects.set_fail_deletes(false);
        server
            .delete(&format!("/api/v1/files/{}", file_id))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_download_unknown_file() {
        let (server, _) = server(MB, &["*/*"]).await;

        let response = server.get("/api/v1/files/download/does-not-exist").await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["success"], false);
    }
}
