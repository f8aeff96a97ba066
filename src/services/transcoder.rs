use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

use crate::config::ConverterConfig;

#[derive(Debug, Error)]
pub enum TranscodeError {
    /// The transcoder process could not be started
    #[error("Transcoder unavailable: {0}")]
    Unavailable(String),

    /// The transcoder ran and refused the input
    #[error("Transcoder rejected input: {0}")]
    Rejected(String),

    #[error("Transcode timed out after {0:?}")]
    TimedOut(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for audio transcoding implementations
#[async_trait::async_trait]
pub trait AudioTranscoder: Send + Sync {
    /// Transcode the audio file at `input` into an MP3 file at `output`
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), TranscodeError>;

    /// Check if the transcoder is available/healthy
    async fn health_check(&self) -> bool;

    fn name(&self) -> &'static str;
}

/// Transcoder shelling out to `ffmpeg` with libmp3lame
pub struct FfmpegTranscoder {
    program: String,
    bitrate: String,
    timeout: Duration,
}

impl FfmpegTranscoder {
    pub fn new(program: String, bitrate: String, timeout: Duration) -> Self {
        Self {
            program,
            bitrate,
            timeout,
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(
            config.ffmpeg_path.clone(),
            config.mp3_bitrate.clone(),
            config.conversion_timeout(),
        )
    }

    fn args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-y".into(), // Overwrite the (pre-created) output file
            "-i".into(),
            input.as_os_str().to_owned(),
            "-vn".into(), // Drop embedded cover art streams
            "-c:a".into(),
            "libmp3lame".into(),
            "-b:a".into(),
            self.bitrate.clone().into(),
            "-f".into(),
            "mp3".into(),
            output.as_os_str().to_owned(),
        ]
    }
}

#[async_trait::async_trait]
impl AudioTranscoder for FfmpegTranscoder {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        let child = Command::new(&self.program)
            .args(self.args(input, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let result = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| TranscodeError::TimedOut(self.timeout))?;

        let output = result.map_err(|e| {
            TranscodeError::Unavailable(format!("failed to start {}: {}", self.program, e))
        })?;

        if !output.status.success() {
            let err_msg = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!("ffmpeg failed ({}): {}", output.status, err_msg);
            let reason = if err_msg.is_empty() {
                format!("ffmpeg exited with {}", output.status)
            } else {
                err_msg
            };
            return Err(TranscodeError::Rejected(reason));
        }

        Ok(())
    }

    async fn health_check(&self) -> bool {
        let version = Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        matches!(
            tokio::time::timeout(Duration::from_secs(5), version).await,
            Ok(Ok(status)) if status.success()
        )
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}

/// Copies input to output untouched, for development/testing
pub struct PassthroughTranscoder;

#[async_trait::async_trait]
impl AudioTranscoder for PassthroughTranscoder {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        tracing::warn!("PassthroughTranscoder: Skipping conversion (development mode)");
        tokio::fs::copy(input, output).await?;
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }
}

/// Factory function to create appropriate transcoder based on config
pub fn create_transcoder(config: &ConverterConfig) -> Box<dyn AudioTranscoder> {
    match config.transcoder_type.to_lowercase().as_str() {
        "ffmpeg" => Box::new(FfmpegTranscoder::from_config(config)),
        "passthrough" | "noop" | "none" => Box::new(PassthroughTranscoder),
        other => {
            tracing::warn!("Unknown transcoder type '{}', using ffmpeg", other);
            Box::new(FfmpegTranscoder::from_config(config))
        }
    }
}
