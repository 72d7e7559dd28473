//! The delivery operations the attendant calls.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::info;

use crate::client::ResilientClient;
use crate::config::{ConfigError, DeliveryConfig, GatewayCredential};
use crate::outcome::DeliveryOutcome;
use crate::phone::{DialPlan, normalize_msisdn};
use crate::pool::InstancePool;

/// Artificial typing delay attached to every send, in milliseconds.
const TYPING_DELAY_MS: u64 = 1200;
const TYPING_PRESENCE: &str = "composing";
const LIST_BUTTON_TEXT: &str = "Escolher";
const LIST_FOOTER_TEXT: &str = "Responda selecionando uma opção abaixo";
const LIST_SECTION_TITLE: &str = "Alternativas";

/// Sends messages through the gateway, rotating instances per logical call.
///
/// A credential is drawn from the pool once per call (or accepted pinned
/// from the caller) and reused across that call's retries; the next call
/// draws the next instance.
pub struct DeliveryService {
    base_url: String,
    pool: Arc<InstancePool>,
    client: ResilientClient,
    dial_plan: DialPlan,
}

impl DeliveryService {
    pub fn new(config: DeliveryConfig, pool: Arc<InstancePool>) -> Self {
        let client = ResilientClient::new(config.timeout, config.max_retries, config.retry_delay);
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            pool,
            client,
            dial_plan: config.dial_plan,
        }
    }

    /// Builds the pool from the config's instance list. The empty list is
    /// reported here so startup can abort.
    pub fn from_config(config: DeliveryConfig) -> Result<Self, ConfigError> {
        let pool = Arc::new(InstancePool::new(config.instances.clone())?);
        Ok(Self::new(config, pool))
    }

    fn endpoint(&self, path: &str, instance: &str) -> String {
        format!("{}/{}/{}", self.base_url, path, instance)
    }

    fn draw(&self, pinned: Option<GatewayCredential>) -> GatewayCredential {
        pinned.unwrap_or_else(|| self.pool.next())
    }

    /// Sends a plain text message.
    pub async fn send_text(&self, number: &str, text: &str) -> DeliveryOutcome {
        self.send_text_with(None, number, text).await
    }

    /// Sends a plain text message through a pinned credential, drawing one
    /// when none is given.
    pub async fn send_text_with(
        &self,
        pinned: Option<GatewayCredential>,
        number: &str,
        text: &str,
    ) -> DeliveryOutcome {
        let number = normalize_msisdn(number, &self.dial_plan);
        let credential = self.draw(pinned);
        let url = self.endpoint("message/sendText", &credential.instance);

        let payload = json!({
            "number": number,
            "text": text,
            "options": {
                "delay": TYPING_DELAY_MS,
                "presence": TYPING_PRESENCE,
            }
        });

        info!(instance = %credential.instance, %number, "sending text message");
        let outcome = self.client.post_json(&url, &credential.api_key, &payload).await;
        if outcome.is_success() {
            outcome.with_instance(&credential.instance)
        } else {
            outcome
        }
    }

    /// Sends a list menu with one row per option. With no options there is
    /// nothing to choose from, so the description goes out as plain text.
    pub async fn send_list(
        &self,
        number: &str,
        title: &str,
        description: &str,
        options: &[String],
    ) -> DeliveryOutcome {
        if options.is_empty() {
            return self.send_text(number, description).await;
        }

        let number = normalize_msisdn(number, &self.dial_plan);
        let credential = self.draw(None);
        let url = self.endpoint("message/sendList", &credential.instance);

        let rows: Vec<Value> = options
            .iter()
            .enumerate()
            .map(|(index, option)| {
                json!({
                    "title": option,
                    "rowId": (index + 1).to_string(),
                })
            })
            .collect();

        let payload = json!({
            "number": number,
            "options": {
                "delay": TYPING_DELAY_MS,
                "presence": TYPING_PRESENCE,
            },
            "listMessage": {
                "title": title,
                "description": description,
                "buttonText": LIST_BUTTON_TEXT,
                "footerText": LIST_FOOTER_TEXT,
                "sections": [{
                    "title": LIST_SECTION_TITLE,
                    "rows": rows,
                }]
            }
        });

        info!(instance = %credential.instance, %number, rows = options.len(), "sending list message");
        let outcome = self.client.post_json(&url, &credential.api_key, &payload).await;
        if outcome.is_success() {
            outcome.with_instance(&credential.instance)
        } else {
            outcome
        }
    }

    /// Submits a batch validity check for the given numbers.
    pub async fn verify_numbers(&self, numbers: &[String]) -> DeliveryOutcome {
        let normalized: Vec<String> = numbers
            .iter()
            .map(|number| normalize_msisdn(number, &self.dial_plan))
            .collect();
        let credential = self.draw(None);
        let url = self.endpoint("chat/whatsappNumbers", &credential.instance);
        let payload = json!({"numbers": normalized});

        info!(instance = %credential.instance, count = normalized.len(), "verifying numbers");
        let outcome = self.client.post_json(&url, &credential.api_key, &payload).await;
        if outcome.is_success() {
            outcome.with_instance(&credential.instance)
        } else {
            outcome
        }
    }
}

/// Valid numbers out of a `verify_numbers` outcome, per the gateway's
/// `{"data": {"valid": [...]}}` response contract.
pub fn valid_subset(outcome: &DeliveryOutcome) -> Vec<String> {
    outcome
        .payload
        .as_ref()
        .and_then(|payload| payload.get("data"))
        .and_then(|data| data.get("valid"))
        .and_then(Value::as_array)
        .map(|valid| {
            valid
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
