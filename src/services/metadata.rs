use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::Accessor;
use std::path::Path;

/// What could be learned about an uploaded file before transcoding it.
/// Every field is best effort; a failed probe never fails the conversion.
#[derive(Debug, Clone, Default)]
pub struct AudioProbe {
    pub mime_type: String,
    pub duration_seconds: Option<u64>,
    pub bitrate: Option<u32>,
    pub title: Option<String>,
    pub artist: Option<String>,
}

impl AudioProbe {
    /// Probe a staged upload. Blocking; run it off the async runtime.
    pub fn from_path(path: &Path) -> Self {
        // 1. Detect MIME type using infer
        let mime_type = infer::get_from_path(path)
            .ok()
            .flatten()
            .map(|k| k.mime_type())
            .unwrap_or("application/octet-stream")
            .to_string();

        let mut probe = AudioProbe {
            mime_type,
            ..Default::default()
        };

        // 2. Lofty for duration and tags
        let reader = Probe::open(path)
            .ok()
            .and_then(|p| p.guess_file_type().ok());
        let Some(reader) = reader else {
            tracing::debug!("Audio probe could not open {:?}", path);
            return probe;
        };

        if let Ok(tagged_file) = reader.read() {
            let properties = tagged_file.properties();
            probe.duration_seconds = Some(properties.duration().as_secs());
            probe.bitrate = properties.audio_bitrate();

            if let Some(tag) = tagged_file.primary_tag() {
                probe.title = tag.title().map(|t| t.to_string());
                probe.artist = tag.artist().map(|a| a.to_string());
            }
        }

        probe
    }

    pub fn looks_like_audio(&self) -> bool {
        // m4a is an MP4 container, infer reports it as audio/m4a or video/mp4
        self.mime_type.starts_with("audio/")
            || self.mime_type.starts_with("video/")
            || self.duration_seconds.is_some()
    }
}
