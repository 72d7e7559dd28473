//! Turns a resolved envelope into plain text.
//!
//! Extraction tries the known message encodings in a fixed priority order.
//! The order encodes real heterogeneity across upstream client versions and
//! must not be reshuffled: voice notes first, then the typed text shapes,
//! then the record-level `text` some clients post, then a last-resort scan
//! for any nested `text` field.

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::types::{InboundEnvelope, MessageBody};

/// Reply used when a voice note cannot be acquired or transcribed.
pub const AUDIO_FALLBACK_TEXT: &str = "Não consegui entender o áudio.";

/// Placeholder when no encoding yields any content.
pub const UNSUPPORTED_TEXT: &str = "[mensagem não suportada]";

/// Boundary to the speech-to-text pipeline. An empty transcript means "no
/// speech detected" and is not an error.
#[async_trait]
pub trait SpeechTranscriber: Send + Sync {
    async fn transcribe(&self, envelope: &InboundEnvelope) -> anyhow::Result<String>;
}

/// Extracts the message text, delegating voice notes to `transcriber`.
/// Always produces a string; failures surface as fixed fallback phrases,
/// never as errors.
pub async fn extract_text(
    envelope: &InboundEnvelope,
    transcriber: &dyn SpeechTranscriber,
) -> String {
    match MessageBody::classify(envelope.message()) {
        MessageBody::Audio(_) => match transcriber.transcribe(envelope).await {
            Ok(transcript) => transcript,
            Err(err) => {
                warn!(sender = %envelope.sender, error = %err, "voice note transcription failed");
                AUDIO_FALLBACK_TEXT.to_string()
            }
        },
        MessageBody::Conversation(text)
        | MessageBody::ExtendedText(text)
        | MessageBody::ButtonReply(text)
        | MessageBody::TemplateButtonReply(text)
        | MessageBody::ListReply(text) => text,
        MessageBody::Unknown => {
            if let Some(text) = envelope.text.clone() {
                return text;
            }
            if let Some(text) = scan_for_text(envelope.message()) {
                return text;
            }
            UNSUPPORTED_TEXT.to_string()
        }
    }
}

/// Last-resort scan: the first field of the message body whose value is an
/// object carrying a `text` string.
fn scan_for_text(message: &Value) -> Option<String> {
    message.as_object()?.values().find_map(|field| {
        field
            .get("text")
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StubTranscriber {
        result: anyhow::Result<String>,
    }

    impl StubTranscriber {
        fn ok(text: &str) -> Self {
            Self {
                result: Ok(text.to_string()),
            }
        }

        fn failing() -> Self {
            Self {
                result: Err(anyhow::anyhow!("acquisition failed")),
            }
        }
    }

    #[async_trait]
    impl SpeechTranscriber for StubTranscriber {
        async fn transcribe(&self, _envelope: &InboundEnvelope) -> anyhow::Result<String> {
            match &self.result {
                Ok(text) => Ok(text.clone()),
                Err(err) => Err(anyhow::anyhow!("{err}")),
            }
        }
    }

    fn envelope_with_message(message: Value) -> InboundEnvelope {
        InboundEnvelope {
            sender: "5586999001122".into(),
            from_me: false,
            text: None,
            record: json!({"key": {"remoteJid": "5586999001122"}, "message": message}),
        }
    }

    #[tokio::test]
    async fn extracts_each_text_shape() {
        let transcriber = StubTranscriber::ok("unused");
        let cases = [
            (json!({"conversation": "oi"}), "oi"),
            (json!({"extendedTextMessage": {"text": "ola"}}), "ola"),
            (json!({"buttonsResponseMessage": {"selectedButtonId": "2"}}), "2"),
            (json!({"templateButtonReplyMessage": {"selectedId": "3"}}), "3"),
            (json!({"listResponseMessage": {"title": "Plano 100MB"}}), "Plano 100MB"),
        ];
        for (message, expected) in cases {
            let env = envelope_with_message(message);
            assert_eq!(extract_text(&env, &transcriber).await, expected);
        }
    }

    #[tokio::test]
    async fn audio_uses_transcript() {
        let env = envelope_with_message(json!({"audioMessage": {"url": "https://cdn/a.enc"}}));
        let transcriber = StubTranscriber::ok("quero contratar o plano");
        assert_eq!(
            extract_text(&env, &transcriber).await,
            "quero contratar o plano"
        );
    }

    #[tokio::test]
    async fn audio_failure_yields_fixed_fallback() {
        let env = envelope_with_message(json!({"audioMessage": {}}));
        let transcriber = StubTranscriber::failing();
        assert_eq!(extract_text(&env, &transcriber).await, AUDIO_FALLBACK_TEXT);
    }

    #[tokio::test]
    async fn empty_transcript_passes_through() {
        // No speech detected is not an error and must not trip the fallback.
        let env = envelope_with_message(json!({"audioMessage": {}}));
        let transcriber = StubTranscriber::ok("");
        assert_eq!(extract_text(&env, &transcriber).await, "");
    }

    #[tokio::test]
    async fn record_text_wins_over_generic_scan() {
        let mut env = envelope_with_message(json!({
            "someMessage": {"text": "nested"}
        }));
        env.text = Some("record level".into());
        let transcriber = StubTranscriber::ok("unused");
        assert_eq!(extract_text(&env, &transcriber).await, "record level");
    }

    #[tokio::test]
    async fn generic_scan_finds_nested_text() {
        let env = envelope_with_message(json!({
            "documentMessage": {"fileName": "x.pdf"},
            "reactionMessage": {"text": "👍"}
        }));
        let transcriber = StubTranscriber::ok("unused");
        assert_eq!(extract_text(&env, &transcriber).await, "👍");
    }

    #[tokio::test]
    async fn placeholder_when_nothing_matches() {
        let env = envelope_with_message(json!({"stickerMessage": {}}));
        let transcriber = StubTranscriber::ok("unused");
        assert_eq!(extract_text(&env, &transcriber).await, UNSUPPORTED_TEXT);
    }
}
