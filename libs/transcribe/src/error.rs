use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranscribeError {
    /// No audio source yielded enough bytes. Not retried; the caller falls
    /// back to the fixed "could not understand" reply.
    #[error("audio acquisition failed: {0}")]
    Acquisition(String),

    /// ffmpeg missing or conversion failed. Internal to the pipeline: the
    /// original bytes are submitted instead.
    #[error("audio conversion failed: {0}")]
    Transcode(String),

    /// The transcription service answered outside 2xx.
    #[error("transcription failed: status {status}: {body}")]
    Transcription { status: u16, body: String },

    #[error("transcription transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
