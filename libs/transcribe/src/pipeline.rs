//! Glues acquisition, transcoding, and transcription together.

use async_trait::async_trait;
use tracing::debug;

use eva_core::{InboundEnvelope, SpeechTranscriber};

use crate::acquire::{MediaFetcher, acquire_audio};
use crate::config::TranscribeConfig;
use crate::error::TranscribeError;
use crate::transcode::Transcoder;
use crate::whisper::WhisperClient;

pub struct TranscriptionPipeline {
    fetcher: MediaFetcher,
    transcoder: Transcoder,
    whisper: WhisperClient,
}

impl TranscriptionPipeline {
    pub fn new(config: TranscribeConfig) -> Self {
        Self {
            fetcher: MediaFetcher::new(config.media_host, config.timeout),
            transcoder: Transcoder::new(config.ffmpeg_bin),
            whisper: WhisperClient::new(config.base_url, config.api_key, config.timeout),
        }
    }

    /// Runs the three stages for one envelope. The scratch directory is
    /// dropped (and deleted) on every path out of this function, including
    /// acquisition and transcription failures.
    pub async fn run(&self, envelope: &InboundEnvelope) -> Result<String, TranscribeError> {
        let (bytes, source) = acquire_audio(envelope, &self.fetcher).await?;
        debug!(?source, len = bytes.len(), sender = %envelope.sender, "voice note acquired");

        let work_dir = tempfile::tempdir()?;
        let prepared = self.transcoder.prepare(&bytes, work_dir.path()).await;
        self.whisper.transcribe(prepared).await
    }
}

#[async_trait]
impl SpeechTranscriber for TranscriptionPipeline {
    async fn transcribe(&self, envelope: &InboundEnvelope) -> anyhow::Result<String> {
        Ok(self.run(envelope).await?)
    }
}
