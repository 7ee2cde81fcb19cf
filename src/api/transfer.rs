//! Import and export handlers.

use super::{AppState, ApiError, blocking};
use crate::io::{Format, ImportReport, ImportStatus};
use axum::Json;
use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Name of the multipart part holding the upload.
pub const FILE_FIELD: &str = "file";
/// Message for an upload without a `file` part.
pub const NO_FILE_PART: &str = "No file part in the request.";
/// Message for a `file` part with an empty filename.
pub const NO_SELECTED_FILE: &str = "No selected file.";

/// Import response body.
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    /// One-line summary.
    pub message: String,
    /// Counts and row errors.
    #[serde(flatten)]
    pub report: ImportReport,
}

impl ImportStatus {
    /// Returns the HTTP status for this outcome.
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::Complete => StatusCode::OK,
            Self::Partial => StatusCode::MULTI_STATUS,
            Self::Failed => StatusCode::BAD_REQUEST,
        }
    }
}

/// `POST /import/csv`
pub async fn import_csv(
    state: State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> std::result::Result<Response, ApiError> {
    import(state, multipart, Format::Csv).await
}

/// `POST /import/json`
pub async fn import_json(
    state: State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> std::result::Result<Response, ApiError> {
    import(state, multipart, Format::Json).await
}

/// `GET /export/csv`
pub async fn export_csv(State(state): State<AppState>) -> std::result::Result<Response, ApiError> {
    export(state, Format::Csv).await
}

/// `GET /export/json`
pub async fn export_json(State(state): State<AppState>) -> std::result::Result<Response, ApiError> {
    export(state, Format::Json).await
}

async fn import(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
    format: Format,
) -> std::result::Result<Response, ApiError> {
    let payload = read_upload(multipart?).await?;
    tracing::info!(format = %format, bytes = payload.len(), "Import upload received");

    let imports = state.imports;
    let report = blocking(move || imports.import_bytes(&payload, format)).await?;

    let status = report.status().http_status();
    let body = ImportResponse {
        message: report.summary(),
        report,
    };
    Ok((status, Json(body)).into_response())
}

async fn export(state: AppState, format: Format) -> std::result::Result<Response, ApiError> {
    let exports = state.exports;
    let (bytes, result) = blocking(move || exports.export_bytes(format)).await?;
    tracing::debug!(format = %format, exported = result.exported, "Export served");

    let disposition = format!("attachment; filename=export.{}", format.extension());
    Ok((
        [
            (header::CONTENT_TYPE, format.mime_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// Reads the `file` part of an upload.
async fn read_upload(mut multipart: Multipart) -> std::result::Result<Bytes, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        if field.file_name().is_some_and(str::is_empty) {
            return Err(ApiError::bad_request(NO_SELECTED_FILE));
        }
        return Ok(field.bytes().await?);
    }
    Err(ApiError::bad_request(NO_FILE_PART))
}
