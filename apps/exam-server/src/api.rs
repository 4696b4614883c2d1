//! API handlers for the exam sheet server
//!
//! Provides:
//! - The upload page
//! - Health check
//! - Exam sheet generation from an uploaded PDF

use std::time::Duration;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::{header, HeaderName, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ServerError;
use crate::AppState;

/// Name of the multipart part carrying the PDF
pub const FILE_FIELD: &str = "file";

/// ASCII name offered to clients that ignore `filename*`
pub const FALLBACK_DOWNLOAD_NAME: &str = "exam_sheet.pdf";

static INDEX_HTML: &str = include_str!("../static/index.html");

/// Build the application router without the rate limiter
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/api/exam-sheet", post(handle_generate))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "exam-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Handler: GET /
pub async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// The PDF part of an upload
struct Upload {
    filename: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// Handler: POST /api/exam-sheet
pub async fn handle_generate(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ServerError> {
    let multipart = multipart.map_err(|e| ServerError::InvalidRequest(e.body_text()))?;
    let upload = read_upload(multipart).await?;
    info!(
        "Exam sheet request: file={}, size={} bytes",
        upload.filename,
        upload.bytes.len()
    );

    if !is_pdf_upload(&upload.filename, upload.content_type.as_deref()) {
        return Err(ServerError::UnsupportedMediaType(format!(
            "'{}' is not a PDF file",
            upload.filename
        )));
    }
    if upload.bytes.is_empty() {
        return Err(ServerError::InvalidRequest("Uploaded file is empty".into()));
    }

    let generator = state.generator.clone();
    let Upload {
        filename, bytes, ..
    } = upload;

    let result = tokio::time::timeout(
        Duration::from_millis(state.timeout_ms),
        tokio::task::spawn_blocking(move || generator.generate(&bytes, &filename)),
    )
    .await;

    let sheet = match result {
        Ok(Ok(generated)) => generated?,
        Ok(Err(join_error)) => {
            return Err(ServerError::Internal(format!(
                "Generation task failed: {}",
                join_error
            )));
        }
        Err(_timeout) => {
            warn!("Generation timed out after {}ms", state.timeout_ms);
            return Err(ServerError::Timeout(state.timeout_ms));
        }
    };

    for warning in &sheet.warnings {
        debug!("Layout warning for {}: {}", sheet.filename, warning);
    }
    debug!(
        "Sending {} ({} bytes, {} pages)",
        sheet.filename,
        sheet.pdf.len(),
        sheet.page_count
    );

    let headers = [
        (header::CONTENT_TYPE, sheet.mime_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            content_disposition(&sheet.filename),
        ),
        (
            HeaderName::from_static("x-page-count"),
            sheet.page_count.to_string(),
        ),
        (
            HeaderName::from_static("x-paragraph-count"),
            sheet.paragraph_count.to_string(),
        ),
    ];

    Ok((StatusCode::OK, headers, sheet.pdf).into_response())
}

/// Take the first part named `file`; other parts are ignored
async fn read_upload(mut multipart: Multipart) -> Result<Upload, ServerError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(Upload {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(ServerError::InvalidRequest(format!(
        "Missing '{}' part in multipart upload",
        FILE_FIELD
    )))
}

fn multipart_error(err: MultipartError) -> ServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge
    } else {
        ServerError::InvalidRequest(err.body_text())
    }
}

/// An upload counts as PDF by its extension or its declared content type
pub fn is_pdf_upload(filename: &str, content_type: Option<&str>) -> bool {
    let by_name = filename.to_ascii_lowercase().ends_with(".pdf");
    let by_type = content_type
        .map(|ct| ct.trim().eq_ignore_ascii_case("application/pdf"))
        .unwrap_or(false);
    by_name || by_type
}

/// `Content-Disposition` with an ASCII fallback and the real UTF-8 name
pub fn content_disposition(filename: &str) -> String {
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        FALLBACK_DOWNLOAD_NAME,
        urlencoding::encode(filename)
    )
}
