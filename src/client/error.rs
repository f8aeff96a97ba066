use thiserror::Error;

/// Every way an upload can end without a download
#[derive(Error, Debug)]
pub enum UploadError {
    /// The picker or the drop yielded no file
    #[error("No file selected")]
    EmptySelection,

    /// Another upload is still in flight on this widget
    #[error("An upload is already in progress")]
    Busy,

    /// The request never completed
    #[error("Could not reach converter: {0}")]
    Transport(String),

    /// The converter answered with a non-success status
    #[error("Converter answered {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Could not read selected file: {0}")]
    Selection(String),

    #[error("Could not save download: {0}")]
    Download(#[from] std::io::Error),
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        UploadError::Transport(err.to_string())
    }
}
