//! Error types for the exam sheet server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use exam_engine::ExamError;
use serde::Serialize;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    /// The upload yielded no text; `detail` says why
    #[error("No text recognized: {detail}")]
    NoTextRecognized { message: &'static str, detail: String },

    /// The exam sheet could not be built; `detail` says why
    #[error("Processing error: {detail}")]
    Processing { message: &'static str, detail: String },

    #[error("Generation timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Upload too large")]
    PayloadTooLarge,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code, message, detail) = match self {
            ServerError::NoTextRecognized { message, detail } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "NO_TEXT_RECOGNIZED",
                message.to_string(),
                Some(detail),
            ),
            ServerError::Processing { message, detail } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PROCESSING_ERROR",
                message.to_string(),
                Some(detail),
            ),
            ServerError::Timeout(ms) => (
                StatusCode::REQUEST_TIMEOUT,
                "TIMEOUT",
                format!("Generation timeout after {}ms", ms),
                None,
            ),
            ServerError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg, None)
            }
            ServerError::UnsupportedMediaType(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_MEDIA_TYPE",
                msg,
                None,
            ),
            ServerError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                "Uploaded file exceeds the size limit".to_string(),
                None,
            ),
            ServerError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
                None,
            ),
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: code.to_string(),
            detail,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ExamError> for ServerError {
    fn from(err: ExamError) -> Self {
        let message = err.user_message();
        match err {
            ExamError::DocumentParse(parse) => {
                tracing::warn!("Document parse error: {}", parse);
                ServerError::NoTextRecognized {
                    message,
                    detail: parse.to_string(),
                }
            }
            ExamError::Render(render) => {
                tracing::error!("Render error: {}", render);
                ServerError::Processing {
                    message,
                    detail: render.to_string(),
                }
            }
        }
    }
}
