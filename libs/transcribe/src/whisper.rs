//! Stage three: the speech-to-text call.

use std::time::Duration;

use reqwest::multipart;
use serde_json::Value;
use tracing::debug;

use crate::error::TranscribeError;
use crate::transcode::PreparedAudio;

/// Fixed model identifier the transcription endpoint expects.
pub const TRANSCRIPTION_MODEL: &str = "whisper-1";

/// Client for an OpenAI-compatible `audio/transcriptions` endpoint.
pub struct WhisperClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl WhisperClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout,
        }
    }

    /// Submits the audio and returns the transcript. An empty transcript
    /// means no speech was detected and is returned as-is.
    pub async fn transcribe(&self, audio: PreparedAudio) -> Result<String, TranscribeError> {
        let part = multipart::Part::bytes(audio.bytes)
            .file_name(audio.file_name)
            .mime_str(audio.mime)?;
        let form = multipart::Form::new()
            .text("model", TRANSCRIPTION_MODEL)
            .part("file", part);

        let response = self
            .http
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscribeError::Transcription {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response.json().await?;
        let transcript = payload
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        debug!(chars = transcript.len(), "transcription completed");
        Ok(transcript)
    }
}
