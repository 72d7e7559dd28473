use std::time::Duration;

/// Configuration for the transcription pipeline, loaded once at startup.
#[derive(Debug, Clone)]
pub struct TranscribeConfig {
    pub api_key: String,
    /// Base URL of the OpenAI-compatible transcription service.
    pub base_url: String,
    /// Host that serves direct-path media downloads.
    pub media_host: String,
    pub timeout: Duration,
    pub ffmpeg_bin: String,
}

impl TranscribeConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
            media_host: std::env::var("MEDIA_HOST")
                .unwrap_or_else(|_| "https://mmg.whatsapp.net".into()),
            timeout: Duration::from_secs(
                std::env::var("MEDIA_TIMEOUT")
                    .ok()
                    .and_then(|value| value.parse().ok())
                    .unwrap_or(30),
            ),
            ffmpeg_bin: std::env::var("FFMPEG_BIN").unwrap_or_else(|_| "ffmpeg".into()),
        }
    }
}
