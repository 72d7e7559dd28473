//! Voice-note transcription pipeline.
//!
//! Three linear stages: locate and fetch the audio bytes from whichever
//! encoding the event carries, transcode them into a format the
//! transcription service accepts (falling back to the original bytes when
//! ffmpeg is unavailable or fails), and submit them for speech-to-text.
//! Temporary files live in a per-invocation scratch directory that is
//! released on every exit path.

pub mod acquire;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod transcode;
pub mod whisper;

pub use acquire::{AudioSource, MIN_AUDIO_BYTES, MediaFetcher, acquire_audio};
pub use config::TranscribeConfig;
pub use error::TranscribeError;
pub use pipeline::TranscriptionPipeline;
pub use transcode::{PreparedAudio, Transcoder};
pub use whisper::{TRANSCRIPTION_MODEL, WhisperClient};
