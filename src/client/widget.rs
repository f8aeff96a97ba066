use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::download::{Download, DownloadSink};
use super::error::UploadError;
use super::file::SelectedFile;
use super::picker::FilePicker;
use super::transport::ConvertTransport;
use crate::utils::filename::download_name;

/// A drag moving over the drop area
#[derive(Debug, Default)]
pub struct DragEvent {
    default_prevented: bool,
}

impl DragEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Files released over the drop area
#[derive(Debug, Default)]
pub struct DropEvent {
    files: Vec<SelectedFile>,
    default_prevented: bool,
}

impl DropEvent {
    pub fn new(files: Vec<SelectedFile>) -> Self {
        Self {
            files,
            default_prevented: false,
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }
}

/// What a finished upload produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReceipt {
    pub filename: String,
    pub bytes: usize,
    pub location: String,
}

/// Click-to-browse and drag-and-drop wired to one upload-and-download round trip.
///
/// All three surfaces are injected. At most one upload runs at a time; a second
/// one started while the first is pending fails with [`UploadError::Busy`].
pub struct UploadWidget {
    picker: Arc<dyn FilePicker>,
    transport: Arc<dyn ConvertTransport>,
    sink: Arc<dyn DownloadSink>,
    busy: AtomicBool,
}

/// Clears the busy flag however the upload ends, including when its future is dropped
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl UploadWidget {
    pub fn new(
        picker: Arc<dyn FilePicker>,
        transport: Arc<dyn ConvertTransport>,
        sink: Arc<dyn DownloadSink>,
    ) -> Self {
        Self {
            picker,
            transport,
            sink,
            busy: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Click on the drop area: open the picker and upload what it yields
    pub async fn select_file(&self) -> Result<DownloadReceipt, UploadError> {
        tracing::debug!("Opening file picker");
        let files = self.picker.pick().await?;
        self.on_file_chosen(files).await
    }

    /// The picker produced a selection; only the first file is used
    pub async fn on_file_chosen(
        &self,
        files: Vec<SelectedFile>,
    ) -> Result<DownloadReceipt, UploadError> {
        let file = files
            .into_iter()
            .next()
            .ok_or(UploadError::EmptySelection)?;
        self.upload(file).await
    }

    /// Keep the platform from opening the dragged file itself
    pub fn on_drag_over(&self, event: &mut DragEvent) {
        event.prevent_default();
    }

    pub async fn on_drop(&self, event: &mut DropEvent) -> Result<DownloadReceipt, UploadError> {
        event.prevent_default();

        if event.files.is_empty() {
            tracing::debug!("Drop carried no files");
            return Err(UploadError::EmptySelection);
        }
        let file = event.files.swap_remove(0);
        self.upload(file).await
    }

    /// POST the file to the converter and deliver the returned blob as `<name>.mp3`
    pub async fn upload(&self, file: SelectedFile) -> Result<DownloadReceipt, UploadError> {
        let _guard = self.begin()?;

        tracing::info!("⬆️  Uploading '{}' ({} bytes)", file.name, file.len());
        let blob = self.transport.convert(&file).await?;

        let filename = download_name(&file.name);
        let bytes = blob.len();
        let location = self
            .sink
            .deliver(Download {
                filename: filename.clone(),
                blob,
            })
            .await?;

        tracing::info!("⬇️  Delivered '{}' ({} bytes) to {}", filename, bytes, location);

        Ok(DownloadReceipt {
            filename,
            bytes,
            location,
        })
    }

    fn begin(&self) -> Result<BusyGuard<'_>, UploadError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| UploadError::Busy)?;
        Ok(BusyGuard(&self.busy))
    }
}
