use crate::api::error::AppError;
use crate::services::conversion_service::StagedUpload;
use crate::utils::filename::{FALLBACK_UPLOAD_NAME, attachment_disposition};
use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{StatusCode, header},
    response::Response,
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;

/// Multipart field carrying the audio
pub const FILE_FIELD: &str = "file";

#[utoipa::path(
    post,
    path = "/convert",
    request_body(content = Multipart, description = "Multipart form with an M4A file in field `file`"),
    responses(
        (status = 200, description = "Converted MP3 as an attachment", content_type = "audio/mpeg"),
        (status = 400, description = "No file provided or file empty"),
        (status = 413, description = "File too large"),
        (status = 422, description = "Input could not be converted"),
        (status = 503, description = "Transcoder unavailable"),
        (status = 504, description = "Conversion timed out")
    ),
    tag = "convert"
)]
pub async fn convert_file(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let result: Result<Response, AppError> = async {
        let mut staged: Option<StagedUpload> = None;

        while let Some(field) = multipart.next_field().await.map_err(AppError::from)? {
            let name = field.name().unwrap_or_default().to_string();

            if name == FILE_FIELD && staged.is_none() {
                let original_filename = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .unwrap_or(FALLBACK_UPLOAD_NAME)
                    .to_string();

                let body_with_io_error = field.map_err(std::io::Error::other);
                let reader = StreamReader::new(body_with_io_error);

                staged = Some(
                    state
                        .conversion_service
                        .stage(&original_filename, reader)
                        .await?,
                );
            } else {
                // Unknown fields (and repeated `file` fields) are drained and ignored
                let mut field = field;
                while field.chunk().await?.is_some() {}
            }
        }

        let staged = staged.ok_or(AppError::BadRequest("No file provided".to_string()))?;

        let converted = state.conversion_service.convert(staged).await?;

        let mut builder = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, converted.content_type)
            .header(header::CONTENT_LENGTH, converted.data.len())
            .header(
                header::CONTENT_DISPOSITION,
                attachment_disposition(&converted.filename),
            )
            .header(header::CACHE_CONTROL, "no-store");

        if let Some(duration) = converted.source.duration_seconds {
            builder = builder.header("x-audio-duration-seconds", duration);
        }

        builder
            .body(Body::from(converted.data))
            .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))
    }
    .await;

    match result {
        Ok(res) => Ok(res),
        Err(e) => {
            // Consume the remaining multipart stream so the client sees the error, not a reset
            tracing::warn!("Conversion failed: {}. Consuming remaining stream...", e);
            while let Ok(Some(mut field)) = multipart.next_field().await {
                while let Ok(Some(_)) = field.chunk().await {}
            }
            Err(e)
        }
    }
}
