use bytes::Bytes;
use std::path::{Path, PathBuf};

use super::error::UploadError;
use crate::utils::filename::{FALLBACK_DOWNLOAD_NAME, sanitize_filename_or};

/// A converted blob and the name it should be saved under.
/// The sink owns it for the length of one delivery; it is freed afterwards.
#[derive(Debug, Clone)]
pub struct Download {
    pub filename: String,
    pub blob: Bytes,
}

/// The surface that turns a converted blob into a saved file
#[async_trait::async_trait]
pub trait DownloadSink: Send + Sync {
    /// Save the download, returning where it ended up
    async fn deliver(&self, download: Download) -> Result<String, UploadError>;
}

/// Saves downloads into a directory, like a browser's download folder.
/// Existing files are never overwritten: `voice.mp3` becomes `voice (1).mp3`.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn free_path(&self, filename: &str) -> Result<PathBuf, UploadError> {
        let candidate = self.dir.join(filename);
        if !tokio::fs::try_exists(&candidate).await? {
            return Ok(candidate);
        }

        let path = Path::new(filename);
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(filename);
        let ext = path.extension().and_then(|e| e.to_str());

        let mut n = 1;
        loop {
            let name = match ext {
                Some(ext) => format!("{} ({}).{}", stem, n, ext),
                None => format!("{} ({})", stem, n),
            };
            let candidate = self.dir.join(name);
            if !tokio::fs::try_exists(&candidate).await? {
                return Ok(candidate);
            }
            n += 1;
        }
    }
}

#[async_trait::async_trait]
impl DownloadSink for DirectorySink {
    async fn deliver(&self, download: Download) -> Result<String, UploadError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let filename = sanitize_filename_or(&download.filename, FALLBACK_DOWNLOAD_NAME);
        let path = self.free_path(&filename).await?;
        tokio::fs::write(&path, &download.blob).await?;

        tracing::info!("💾 Saved {} ({} bytes)", path.display(), download.blob.len());
        Ok(path.display().to_string())
    }
}
