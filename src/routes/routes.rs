//! Defines the HTTP surface of the gateway.
//!
//! ## Structure
//! - **File endpoints**, under `/api/FileManagement`
//!   - `POST /upload-file` upload a multipart `file` field
//!   - `GET  /list-files` list every stored file name
//!   - `GET  /download/{file_name}` stream a file back
//!
//! - **Probes**
//!   - `GET /healthz` liveness
//!   - `GET /readyz` object store reachability

use crate::{
    handlers::{
        file_handlers::{download_file, list_files, upload_file},
        health_handlers::{healthz, readyz},
    },
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Build the router. Request bodies above `max_upload_bytes` are rejected.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    let files = Router::new()
        .route("/upload-file", post(upload_file))
        .route("/list-files", get(list_files))
        .route("/download/{file_name}", get(download_file));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .nest("/api/FileManagement", files)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
