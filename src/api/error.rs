use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::io;
use thiserror::Error;

use crate::services::transcoder::TranscodeError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Timed Out: {0}")]
    Timeout(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl From<TranscodeError> for AppError {
    fn from(err: TranscodeError) -> Self {
        match err {
            TranscodeError::Rejected(reason) => {
                AppError::Unprocessable(format!("Could not convert audio: {}", reason))
            }
            TranscodeError::Unavailable(reason) => AppError::ServiceUnavailable(reason),
            TranscodeError::TimedOut(after) => {
                AppError::Timeout(format!("Conversion timed out after {}s", after.as_secs()))
            }
            TranscodeError::Io(e) => AppError::Internal(format!("Transcoder I/O error: {}", e)),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        // axum reports a tripped body limit as 413 on the error itself
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
        } else {
            AppError::BadRequest(err.body_text())
        }
    }
}

impl AppError {
    /// Classify a failed read of an upload stream. Multipart errors travel
    /// through `StreamReader` wrapped in an `io::Error`.
    pub fn from_upload_read(err: io::Error) -> Self {
        if let Some(multipart) = err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<MultipartError>())
        {
            if multipart.status() == StatusCode::PAYLOAD_TOO_LARGE {
                return AppError::PayloadTooLarge(
                    "Request body exceeds the maximum allowed limit".to_string(),
                );
            }
        }
        AppError::BadRequest(format!("Failed to read upload: {}", err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::ServiceUnavailable(msg) => {
                tracing::error!("Transcoder unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Conversion service unavailable".to_string(),
                )
            }
            AppError::Timeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Anyhow(e) => {
                tracing::error!("Anyhow error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
