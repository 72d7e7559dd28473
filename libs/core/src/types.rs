use serde_json::Value;

static NULL: Value = Value::Null;

/// Normalized inbound message resolved from a webhook payload.
///
/// The `record` keeps the raw resolved node so downstream stages (audio
/// acquisition in particular) can reach encodings the typed view does not
/// carry. An envelope is built once per webhook delivery and discarded after
/// a single extraction pass.
#[derive(Debug, Clone)]
pub struct InboundEnvelope {
    /// Opaque routing id of the peer (`key.remoteJid`).
    pub sender: String,
    /// Whether the event echoes a message this bot sent itself.
    pub from_me: bool,
    /// Record-level `text` field, posted by some client builds as a sibling
    /// of `key`/`message` instead of inside the message node.
    pub text: Option<String>,
    /// The raw resolved record (`key` + `message` + siblings).
    pub record: Value,
}

impl InboundEnvelope {
    /// The message node of the record, or `Null` when the record has none.
    pub fn message(&self) -> &Value {
        self.record.get("message").unwrap_or(&NULL)
    }

    /// The voice-note node, when present.
    pub fn audio(&self) -> Option<&Value> {
        self.message().get("audioMessage")
    }
}

/// The known encodings of a message body, one constructor per upstream
/// client shape. Classification is a single ordered scan, so a body that
/// carries several encodings resolves to the highest-priority one.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    /// Voice note; the payload is the `audioMessage` node.
    Audio(Value),
    /// Plain `conversation` text.
    Conversation(String),
    /// `extendedTextMessage.text` (links, quotes, formatted text).
    ExtendedText(String),
    /// `buttonsResponseMessage.selectedButtonId`.
    ButtonReply(String),
    /// `templateButtonReplyMessage.selectedId`.
    TemplateButtonReply(String),
    /// `listResponseMessage.title`.
    ListReply(String),
    /// None of the known shapes matched.
    Unknown,
}

impl MessageBody {
    pub fn classify(message: &Value) -> MessageBody {
        if let Some(audio) = message.get("audioMessage") {
            return MessageBody::Audio(audio.clone());
        }
        if let Some(text) = non_empty_str(message.get("conversation")) {
            return MessageBody::Conversation(text);
        }
        if let Some(text) = non_empty_str(
            message
                .get("extendedTextMessage")
                .and_then(|node| node.get("text")),
        ) {
            return MessageBody::ExtendedText(text);
        }
        if let Some(id) = non_empty_str(
            message
                .get("buttonsResponseMessage")
                .and_then(|node| node.get("selectedButtonId")),
        ) {
            return MessageBody::ButtonReply(id);
        }
        if let Some(id) = non_empty_str(
            message
                .get("templateButtonReplyMessage")
                .and_then(|node| node.get("selectedId")),
        ) {
            return MessageBody::TemplateButtonReply(id);
        }
        if let Some(title) = non_empty_str(
            message
                .get("listResponseMessage")
                .and_then(|node| node.get("title")),
        ) {
            return MessageBody::ListReply(title);
        }
        MessageBody::Unknown
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(record: Value) -> InboundEnvelope {
        InboundEnvelope {
            sender: "5586999001122".into(),
            from_me: false,
            text: None,
            record,
        }
    }

    #[test]
    fn classify_prefers_audio_over_text() {
        let message = json!({
            "audioMessage": {"url": "https://cdn/audio.enc"},
            "conversation": "also here"
        });
        assert!(matches!(
            MessageBody::classify(&message),
            MessageBody::Audio(_)
        ));
    }

    #[test]
    fn classify_each_known_shape() {
        let cases = [
            (json!({"conversation": "oi"}), MessageBody::Conversation("oi".into())),
            (
                json!({"extendedTextMessage": {"text": "ola"}}),
                MessageBody::ExtendedText("ola".into()),
            ),
            (
                json!({"buttonsResponseMessage": {"selectedButtonId": "btn_2"}}),
                MessageBody::ButtonReply("btn_2".into()),
            ),
            (
                json!({"templateButtonReplyMessage": {"selectedId": "tpl_1"}}),
                MessageBody::TemplateButtonReply("tpl_1".into()),
            ),
            (
                json!({"listResponseMessage": {"title": "Plano 200MB"}}),
                MessageBody::ListReply("Plano 200MB".into()),
            ),
        ];
        for (message, expected) in cases {
            assert_eq!(MessageBody::classify(&message), expected);
        }
    }

    #[test]
    fn classify_skips_empty_conversation() {
        let message = json!({
            "conversation": "",
            "extendedTextMessage": {"text": "fallback"}
        });
        assert_eq!(
            MessageBody::classify(&message),
            MessageBody::ExtendedText("fallback".into())
        );
    }

    #[test]
    fn classify_unknown_for_unrecognized_body() {
        assert_eq!(
            MessageBody::classify(&json!({"stickerMessage": {}})),
            MessageBody::Unknown
        );
    }

    #[test]
    fn envelope_accessors_reach_message_and_audio() {
        let env = envelope(json!({
            "key": {"remoteJid": "5586999001122"},
            "message": {"audioMessage": {"seconds": 4}}
        }));
        assert!(env.audio().is_some());
        assert_eq!(env.message()["audioMessage"]["seconds"], 4);

        let bare = envelope(json!({"key": {"remoteJid": "x"}}));
        assert!(bare.message().is_null());
        assert!(bare.audio().is_none());
    }
}
