//! HTTP handlers for the file endpoints.
//!
//! Each handler provisions the bucket first, then delegates to
//! `StorageGateway` and maps its outcome onto a status code: success is 200,
//! a missing file is 404, any other storage failure is 400, and a bucket that
//! cannot be provisioned is 500.
//!
//! Uploads are buffered in memory before they reach the gateway, so the
//! largest accepted file is bounded by the router's `DefaultBodyLimit`
//! (`max_upload_bytes`). Downloads are streamed.

use crate::{
    errors::AppError,
    models::names::ObjectKey,
    services::backend::UploadBody,
    state::AppState,
};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State},
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

/// Multipart field carrying the uploaded file.
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_url: String,
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

/// `POST /api/FileManagement/upload-file`
#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?;
        upload = Some((file_name, content_type, data));
        break;
    }

    let Some((file_name, content_type, data)) = upload.filter(|(_, _, data)| !data.is_empty())
    else {
        return Err(AppError::bad_request("no file was uploaded"));
    };
    let key = ObjectKey::parse(file_name)?;
    info!(%key, size = data.len(), "upload received");

    ensure_bucket(&state).await?;
    let body = UploadBody::from_bytes(data).with_content_type(content_type);
    let outcome = state
        .gateway
        .upload_object(body, &key, &state.bucket)
        .await?;

    Ok(Json(UploadResponse {
        file_url: outcome.public_url,
        file_name: outcome.object_key.to_string(),
        etag: outcome.etag,
    }))
}

/// `GET /api/FileManagement/list-files`
#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    ensure_bucket(&state).await?;
    let listing = state.gateway.list_objects(&state.bucket).await?;
    Ok(Json(listing.object_keys))
}

/// `GET /api/FileManagement/download/{file_name}`, streamed from the store.
#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn download_file(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Response, AppError> {
    let key = ObjectKey::parse(file_name)?;
    info!(%key, "download requested");
    ensure_bucket(&state).await?;
    let download = state.gateway.download_object(&key, &state.bucket).await?;

    let mut response = Response::new(Body::from_stream(download.content));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(download.content_type),
    );
    if let Some(length) = download.content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }
    headers.insert(
        header::CONTENT_DISPOSITION,
        content_disposition(&download.object_key),
    );

    Ok(response)
}

async fn ensure_bucket(state: &AppState) -> Result<(), AppError> {
    state
        .gateway
        .ensure_bucket(&state.bucket)
        .await
        .map_err(|err| AppError::internal(err.to_string()))
}

/// `attachment; filename="…"`, or a bare `attachment` when the name cannot
/// be carried in a header.
fn content_disposition(key: &ObjectKey) -> HeaderValue {
    let file_name = key
        .as_str()
        .rsplit('/')
        .next()
        .unwrap_or(key.as_str())
        .replace('"', "_");
    HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
