//! Stage one: locate and fetch the raw audio bytes.
//!
//! Upstream clients deliver voice notes in several encodings; the sources
//! are tried in a fixed priority order and the first one that yields enough
//! bytes wins. There is no backtracking once bytes are obtained.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::Value;
use tracing::debug;

use eva_core::InboundEnvelope;

use crate::error::TranscribeError;

/// Anything shorter than this cannot be a real voice note; tiny payloads
/// are usually placeholder or preview blobs.
pub const MIN_AUDIO_BYTES: usize = 100;

/// Where the bytes were found. Exactly one source is selected per envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioSource {
    /// `audioMessage.base64`, possibly data-URI framed.
    InlineBase64 { data: String },
    /// Base64 under the `ptt` container some client builds emit.
    PttInline { data: String },
    /// Base64 in the record-level `body` field.
    RecordBody { data: String },
    /// Downloadable media URL.
    RemoteUrl { url: String },
    /// Media path served by the fixed media host, optionally authorized
    /// with the message's media key.
    DirectPath {
        path: String,
        media_key: Option<String>,
    },
}

/// Fetches remote audio with a bounded timeout.
pub struct MediaFetcher {
    http: reqwest::Client,
    media_host: String,
    timeout: Duration,
}

impl MediaFetcher {
    pub fn new(media_host: String, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            media_host: media_host.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    async fn fetch_url(&self, url: &str) -> Result<Vec<u8>, TranscribeError> {
        let response = self
            .http
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn fetch_direct_path(
        &self,
        path: &str,
        media_key: Option<&str>,
    ) -> Result<Vec<u8>, TranscribeError> {
        let url = format!("{}/{}", self.media_host, path.trim_start_matches('/'));
        let mut request = self.http.get(&url).timeout(self.timeout);
        if let Some(key) = media_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }
        let response = request.send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Lists the candidate sources present on the envelope, highest priority
/// first.
fn candidate_sources(envelope: &InboundEnvelope) -> Vec<AudioSource> {
    let mut candidates = Vec::new();
    let message = envelope.message();
    let audio = envelope.audio().unwrap_or(&Value::Null);

    if let Some(data) = audio.get("base64").and_then(Value::as_str) {
        candidates.push(AudioSource::InlineBase64 { data: data.into() });
    }
    if let Some(data) = message
        .get("ptt")
        .and_then(|ptt| ptt.get("base64"))
        .and_then(Value::as_str)
    {
        candidates.push(AudioSource::PttInline { data: data.into() });
    }
    if let Some(data) = envelope.record.get("body").and_then(Value::as_str) {
        candidates.push(AudioSource::RecordBody { data: data.into() });
    }
    if let Some(url) = audio.get("url").and_then(Value::as_str) {
        candidates.push(AudioSource::RemoteUrl { url: url.into() });
    }
    if let Some(path) = audio.get("directPath").and_then(Value::as_str) {
        candidates.push(AudioSource::DirectPath {
            path: path.into(),
            media_key: audio
                .get("mediaKey")
                .and_then(Value::as_str)
                .map(str::to_string),
        });
    }
    candidates
}

/// Tries each candidate source in priority order and returns the first one
/// that yields at least [`MIN_AUDIO_BYTES`] decoded bytes.
pub async fn acquire_audio(
    envelope: &InboundEnvelope,
    fetcher: &MediaFetcher,
) -> Result<(Vec<u8>, AudioSource), TranscribeError> {
    for source in candidate_sources(envelope) {
        let fetched = match &source {
            AudioSource::InlineBase64 { data }
            | AudioSource::PttInline { data }
            | AudioSource::RecordBody { data } => decode_inline(data),
            AudioSource::RemoteUrl { url } => fetcher.fetch_url(url).await,
            AudioSource::DirectPath { path, media_key } => {
                fetcher.fetch_direct_path(path, media_key.as_deref()).await
            }
        };
        match fetched {
            Ok(bytes) if bytes.len() >= MIN_AUDIO_BYTES => {
                debug!(?source, len = bytes.len(), "audio bytes acquired");
                return Ok((bytes, source));
            }
            Ok(bytes) => {
                debug!(?source, len = bytes.len(), "audio source too small, trying next");
            }
            Err(err) => {
                debug!(?source, error = %err, "audio source failed, trying next");
            }
        }
    }

    Err(TranscribeError::Acquisition(format!(
        "no source yielded at least {MIN_AUDIO_BYTES} bytes"
    )))
}

/// Decodes inline base64: strips an optional data-URI prefix and embedded
/// whitespace, then pads to a multiple of four before decoding.
fn decode_inline(data: &str) -> Result<Vec<u8>, TranscribeError> {
    let data = match data.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    let mut cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    while cleaned.len() % 4 != 0 {
        cleaned.push('=');
    }
    BASE64
        .decode(&cleaned)
        .map_err(|err| TranscribeError::Acquisition(format!("invalid base64 payload: {err}")))
}
