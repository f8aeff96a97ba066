use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::Semaphore;

use crate::api::error::AppError;
use crate::config::ConverterConfig;
use crate::services::metadata::AudioProbe;
use crate::services::transcoder::AudioTranscoder;
use crate::utils::filename::{converted_name, sanitize_filename};

pub const MP3_CONTENT_TYPE: &str = "audio/mpeg";

/// An upload written to a local temp file. The file is removed on drop.
pub struct StagedUpload {
    pub filename: String,
    pub size: u64,
    file: NamedTempFile,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[derive(Debug)]
pub struct ConvertedAudio {
    pub filename: String,
    pub content_type: &'static str,
    pub data: Bytes,
    pub source: AudioProbe,
}

pub struct ConversionService {
    transcoder: Arc<dyn AudioTranscoder>,
    permits: Arc<Semaphore>,
    config: ConverterConfig,
}

impl ConversionService {
    pub fn new(transcoder: Arc<dyn AudioTranscoder>, config: ConverterConfig) -> Self {
        Self {
            transcoder,
            permits: Arc::new(Semaphore::new(config.max_concurrent_conversions.max(1))),
            config,
        }
    }

    pub fn transcoder(&self) -> &Arc<dyn AudioTranscoder> {
        &self.transcoder
    }

    /// Stream an upload to a temp file, enforcing the size limit while copying.
    pub async fn stage(
        &self,
        filename: &str,
        reader: impl AsyncRead + Unpin + Send,
    ) -> Result<StagedUpload, AppError> {
        let filename = sanitize_filename(filename);

        let file = tempfile::Builder::new()
            .prefix("input-")
            .suffix(".m4a")
            .tempfile()
            .map_err(|e| AppError::Internal(format!("Failed to create temp file: {}", e)))?;
        let handle = file
            .reopen()
            .map_err(|e| AppError::Internal(format!("Failed to open temp file: {}", e)))?;
        let mut out = tokio::fs::File::from_std(handle);

        // One byte over the limit is enough to know it is too large
        let limit = self.config.max_file_size as u64;
        let mut limited = reader.take(limit + 1);
        let size = tokio::io::copy(&mut limited, &mut out)
            .await
            .map_err(AppError::from_upload_read)?;

        if size > limit {
            return Err(AppError::PayloadTooLarge(format!(
                "File exceeds the {} MB limit",
                self.config.max_file_size / 1024 / 1024
            )));
        }
        if size == 0 {
            return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
        }

        tracing::info!("📥 Staged upload '{}' ({} bytes)", filename, size);

        Ok(StagedUpload {
            filename,
            size,
            file,
        })
    }

    /// Transcode a staged upload into MP3 and read the result back.
    pub async fn convert(&self, staged: StagedUpload) -> Result<ConvertedAudio, AppError> {
        let probe_path = staged.path().to_path_buf();
        let source = tokio::task::spawn_blocking(move || AudioProbe::from_path(&probe_path))
            .await
            .unwrap_or_default();

        if !source.looks_like_audio() {
            tracing::warn!(
                "Upload '{}' does not look like audio ({}), converting anyway",
                staged.filename,
                source.mime_type
            );
        }

        let output = tempfile::Builder::new()
            .prefix("output-")
            .suffix(".mp3")
            .tempfile()
            .map_err(|e| AppError::Internal(format!("Failed to create temp file: {}", e)))?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| AppError::Internal(format!("Conversion queue closed: {}", e)))?;

        let started = std::time::Instant::now();
        self.transcoder
            .transcode(staged.path(), output.path())
            .await?;

        let data = tokio::fs::read(output.path())
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read converted file: {}", e)))?;

        if data.is_empty() {
            return Err(AppError::Unprocessable(
                "Conversion produced no audio".to_string(),
            ));
        }

        let filename = converted_name(&staged.filename);
        tracing::info!(
            "🎵 Converted '{}' -> '{}' ({} -> {} bytes, {:?}) via {}",
            staged.filename,
            filename,
            staged.size,
            data.len(),
            started.elapsed(),
            self.transcoder.name()
        );
        tracing::debug!(
            "Source audio: {}, {}s, {} kbps, title={:?}, artist={:?}",
            source.mime_type,
            source
                .duration_seconds
                .map(|d| d.to_string())
                .unwrap_or_else(|| "?".to_string()),
            source
                .bitrate
                .map(|b| b.to_string())
                .unwrap_or_else(|| "?".to_string()),
            source.title.as_deref().unwrap_or(""),
            source.artist.as_deref().unwrap_or("")
        );

        Ok(ConvertedAudio {
            filename,
            content_type: MP3_CONTENT_TYPE,
            data: Bytes::from(data),
            source,
        })
    }
}
