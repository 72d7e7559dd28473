use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Success,
    Error,
}

/// Result of one delivery operation. Every operation resolves to this shape;
/// nothing past the service boundary throws.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryOutcome {
    pub status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Instance that carried the send, set on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl DeliveryOutcome {
    pub fn success(payload: Value) -> Self {
        Self {
            status: DeliveryStatus::Success,
            payload: Some(payload),
            message: None,
            instance: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: DeliveryStatus::Error,
            payload: None,
            message: Some(message.into()),
            instance: None,
        }
    }

    pub fn with_instance(mut self, instance: &str) -> Self {
        self.instance = Some(instance.to_string());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == DeliveryStatus::Success
    }
}
