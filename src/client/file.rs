use bytes::Bytes;
use std::path::Path;

use super::error::UploadError;

/// A file chosen through the picker or dropped on the widget.
/// Consumed by a single upload and not retained afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub content: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self, UploadError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| UploadError::Selection(format!("{} is not a file", path.display())))?
            .to_string();

        let content = tokio::fs::read(path)
            .await
            .map_err(|e| UploadError::Selection(format!("{}: {}", path.display(), e)))?;

        Ok(Self::new(name, content))
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_path_reads_name_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voice.m4a");
        tokio::fs::write(&path, b"0123456789").await.unwrap();

        let file = SelectedFile::from_path(&path).await.unwrap();
        assert_eq!(file.name, "voice.m4a");
        assert_eq!(file.len(), 10);
        assert!(!file.is_empty());
    }

    #[tokio::test]
    async fn test_from_path_missing_file() {
        let err = SelectedFile::from_path(Path::new("/nonexistent/voice.m4a"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Selection(_)));
    }
}
