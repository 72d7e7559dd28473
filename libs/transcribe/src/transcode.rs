//! Stage two: convert acquired bytes into the format the transcription
//! service accepts.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::TranscribeError;

/// Audio ready for upload: bytes plus the filename/mime pair the multipart
/// form advertises.
#[derive(Debug, Clone)]
pub struct PreparedAudio {
    pub bytes: Vec<u8>,
    pub file_name: &'static str,
    pub mime: &'static str,
}

/// Converts voice notes to mono 16 kHz mp3 via ffmpeg. Conversion failures
/// are not fatal: the original bytes are submitted under a generic
/// container type instead.
pub struct Transcoder {
    ffmpeg_bin: String,
}

impl Transcoder {
    pub fn new(ffmpeg_bin: String) -> Self {
        Self { ffmpeg_bin }
    }

    /// Prepares `raw` for upload, writing intermediates under `work_dir`.
    /// The caller owns `work_dir` and its cleanup.
    pub async fn prepare(&self, raw: &[u8], work_dir: &Path) -> PreparedAudio {
        match self.convert(raw, work_dir).await {
            Ok(bytes) => PreparedAudio {
                bytes,
                file_name: "audio.mp3",
                mime: "audio/mpeg",
            },
            Err(err) => {
                warn!(error = %err, "transcode failed, submitting original bytes");
                PreparedAudio {
                    bytes: raw.to_vec(),
                    file_name: "audio.ogg",
                    mime: "audio/ogg",
                }
            }
        }
    }

    async fn convert(&self, raw: &[u8], work_dir: &Path) -> Result<Vec<u8>, TranscribeError> {
        let input: PathBuf = work_dir.join("input.ogg");
        let output: PathBuf = work_dir.join("audio.mp3");
        tokio::fs::write(&input, raw).await?;

        let result = Command::new(&self.ffmpeg_bin)
            .arg("-y")
            .arg("-i")
            .arg(&input)
            .arg("-ac")
            .arg("1")
            .arg("-ar")
            .arg("16000")
            .arg("-b:a")
            .arg("48k")
            .arg(&output)
            .output()
            .await
            .map_err(|err| {
                TranscribeError::Transcode(format!("{} unavailable: {err}", self.ffmpeg_bin))
            })?;

        if !result.status.success() {
            let stderr: String = String::from_utf8_lossy(&result.stderr)
                .trim()
                .chars()
                .take(240)
                .collect();
            return Err(TranscribeError::Transcode(stderr));
        }

        let bytes = tokio::fs::read(&output).await?;
        debug!(input = raw.len(), output = bytes.len(), "audio transcoded");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_ffmpeg_falls_back_to_original_bytes() {
        let work = tempfile::tempdir().unwrap();
        let transcoder = Transcoder::new("ffmpeg-binary-that-does-not-exist".into());
        let raw = vec![0x4f; 200];

        let prepared = transcoder.prepare(&raw, work.path()).await;

        assert_eq!(prepared.bytes, raw);
        assert_eq!(prepared.file_name, "audio.ogg");
        assert_eq!(prepared.mime, "audio/ogg");
    }

    #[tokio::test]
    async fn scratch_files_vanish_with_the_work_dir() {
        let work = tempfile::tempdir().unwrap();
        let path = work.path().to_path_buf();
        let transcoder = Transcoder::new("ffmpeg-not-installed".into());

        let _ = transcoder.prepare(&[0x4f; 200], &path).await;
        assert!(path.join("input.ogg").exists());

        drop(work);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn conversion_failure_falls_back_to_original_bytes() {
        // /bin/false exits nonzero without reading its arguments, standing
        // in for an ffmpeg that rejects the input.
        let work = tempfile::tempdir().unwrap();
        let transcoder = Transcoder::new("false".into());
        let raw = vec![0x4f; 200];

        let prepared = transcoder.prepare(&raw, work.path()).await;

        assert_eq!(prepared.bytes, raw);
        assert_eq!(prepared.mime, "audio/ogg");
    }
}
