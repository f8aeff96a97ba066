//! The upload widget and the surfaces it is wired to.

pub mod download;
pub mod error;
pub mod file;
pub mod picker;
pub mod transport;
pub mod widget;

pub use download::{DirectorySink, Download, DownloadSink};
pub use error::UploadError;
pub use file::SelectedFile;
pub use picker::{FilePicker, StdinPicker};
pub use transport::{ConvertTransport, HttpTransport};
pub use widget::{DownloadReceipt, DragEvent, DropEvent, UploadWidget};
