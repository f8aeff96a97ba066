use crate::config::ConverterConfig;
use crate::services::transcoder::AudioTranscoder;
use std::sync::Arc;
use tracing::info;

pub async fn setup_transcoder(config: &ConverterConfig) -> Arc<dyn AudioTranscoder> {
    let transcoder = crate::services::transcoder::create_transcoder(config);

    if transcoder.health_check().await {
        info!("🎛️  Transcoder '{}' ready", transcoder.name());
    } else {
        tracing::warn!(
            "⚠️  Transcoder '{}' unreachable (FFMPEG_PATH={})! Conversions will fail until it is installed.",
            transcoder.name(),
            config.ffmpeg_path
        );
    }

    transcoder.into()
}
