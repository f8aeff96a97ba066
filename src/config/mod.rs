use std::env;
use std::time::Duration;

/// Server-side conversion configuration
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Maximum upload size in bytes (default: 200 MB)
    pub max_file_size: usize,

    /// Transcoder type: "ffmpeg" or "passthrough" (default: "ffmpeg")
    pub transcoder_type: String,

    /// ffmpeg executable (default: "ffmpeg", resolved through PATH)
    pub ffmpeg_path: String,

    /// MP3 bitrate handed to libmp3lame (default: "192k")
    pub mp3_bitrate: String,

    /// Seconds a single transcode may run before it is killed (default: 300)
    pub conversion_timeout_secs: u64,

    /// Number of transcodes allowed to run at once (default: 4)
    pub max_concurrent_conversions: usize,

    /// Allowed CORS Origins (comma separated)
    pub allowed_origins: Vec<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            max_file_size: 200 * 1024 * 1024, // 200 MB
            transcoder_type: "ffmpeg".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            mp3_bitrate: "192k".to_string(),
            conversion_timeout_secs: 300,
            max_concurrent_conversions: 4,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl ConverterConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            transcoder_type: env::var("TRANSCODER_TYPE").unwrap_or(default.transcoder_type),

            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or(default.ffmpeg_path),

            mp3_bitrate: env::var("MP3_BITRATE").unwrap_or(default.mp3_bitrate),

            conversion_timeout_secs: env::var("CONVERSION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.conversion_timeout_secs),

            max_concurrent_conversions: env::var("MAX_CONCURRENT_CONVERSIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(default.max_concurrent_conversions),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(default.allowed_origins),
        }
    }

    /// Config for development and tests: no ffmpeg needed, bytes pass through
    pub fn development() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            transcoder_type: "passthrough".to_string(),
            conversion_timeout_secs: 30,
            ..Self::default()
        }
    }

    pub fn conversion_timeout(&self) -> Duration {
        Duration::from_secs(self.conversion_timeout_secs)
    }
}

/// Configuration of the upload client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the converter (default: "http://localhost:3000")
    pub server_url: String,

    /// Directory downloads are saved to (default: current directory)
    pub download_dir: String,

    /// Whole-request timeout in seconds (default: none)
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:3000".to_string(),
            download_dir: ".".to_string(),
            request_timeout_secs: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            server_url: env::var("CONVERTER_URL").unwrap_or(default.server_url),
            download_dir: env::var("DOWNLOAD_DIR").unwrap_or(default.download_dir),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }
}
