use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::error::UploadError;
use super::file::SelectedFile;

/// The platform's file selection surface
#[async_trait::async_trait]
pub trait FilePicker: Send + Sync {
    /// Open the picker and wait for the user's selection (possibly empty)
    async fn pick(&self) -> Result<Vec<SelectedFile>, UploadError>;
}

/// Terminal picker: asks for one path on stdin. A blank line selects nothing.
pub struct StdinPicker;

#[async_trait::async_trait]
impl FilePicker for StdinPicker {
    async fn pick(&self) -> Result<Vec<SelectedFile>, UploadError> {
        let prompt_failed = |e: std::io::Error| UploadError::Selection(e.to_string());

        let mut stderr = tokio::io::stderr();
        stderr
            .write_all(b"Path to .m4a file: ")
            .await
            .map_err(prompt_failed)?;
        stderr.flush().await.map_err(prompt_failed)?;

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(prompt_failed)?;

        let path = line.trim();
        if path.is_empty() {
            return Ok(Vec::new());
        }

        let file = SelectedFile::from_path(&PathBuf::from(path)).await?;
        Ok(vec![file])
    }
}
