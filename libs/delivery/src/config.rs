//! Delivery configuration loaded once at process start.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::phone::DialPlan;

/// One gateway account: the instance name addressed in the URL path plus
/// the key sent in the `apikey` header.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GatewayCredential {
    pub instance: String,
    pub api_key: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    MissingVar(&'static str),
    #[error("failed to parse EVOLUTION_API_INSTANCES: {0}")]
    InvalidInstances(#[source] serde_json::Error),
    #[error("no gateway instances configured")]
    NoInstances,
}

#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    pub base_url: String,
    pub instances: Vec<GatewayCredential>,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub dial_plan: DialPlan,
}

impl DeliveryConfig {
    /// Reads the delivery configuration from the environment.
    ///
    /// `EVOLUTION_API_URL` is required; `EVOLUTION_API_INSTANCES` is a JSON
    /// list of `{"instance": ..., "api_key": ...}` pairs. An empty or
    /// malformed instance list is a configuration error here rather than a
    /// per-send failure later.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("EVOLUTION_API_URL")
            .ok()
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingVar("EVOLUTION_API_URL"))?;

        let instances_raw =
            std::env::var("EVOLUTION_API_INSTANCES").unwrap_or_else(|_| "[]".into());
        let instances: Vec<GatewayCredential> =
            serde_json::from_str(&instances_raw).map_err(ConfigError::InvalidInstances)?;

        let timeout = Duration::from_secs(env_u64("EVOLUTION_API_TIMEOUT", 30));
        let max_retries = env_u64("EVOLUTION_API_MAX_RETRIES", 3) as u32;
        let retry_delay = Duration::from_secs(env_u64("EVOLUTION_API_RETRY_DELAY", 2));

        let dial_plan = DialPlan {
            country_code: std::env::var("PHONE_COUNTRY_CODE").unwrap_or_else(|_| "55".into()),
            mobile_prefix: std::env::var("PHONE_MOBILE_PREFIX")
                .ok()
                .and_then(|value| value.chars().next())
                .unwrap_or('9'),
        };

        Ok(Self {
            base_url,
            instances,
            timeout,
            max_retries,
            retry_delay,
            dial_plan,
        })
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    #[test]
    fn defaults_are_applied() {
        let _guard = env_lock().lock().unwrap();
        unsafe {
            std::env::set_var("EVOLUTION_API_URL", "https://gw.example.com");
            std::env::set_var(
                "EVOLUTION_API_INSTANCES",
                r#"[{"instance": "bot-1", "api_key": "k1"}]"#,
            );
            std::env::remove_var("EVOLUTION_API_TIMEOUT");
            std::env::remove_var("EVOLUTION_API_MAX_RETRIES");
            std::env::remove_var("EVOLUTION_API_RETRY_DELAY");
            std::env::remove_var("PHONE_COUNTRY_CODE");
            std::env::remove_var("PHONE_MOBILE_PREFIX");
        }

        let config = DeliveryConfig::from_env().expect("config");
        assert_eq!(config.base_url, "https://gw.example.com");
        assert_eq!(config.instances.len(), 1);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(2));
        assert_eq!(config.dial_plan.country_code, "55");
        assert_eq!(config.dial_plan.mobile_prefix, '9');
    }

    #[test]
    fn missing_base_url_is_rejected() {
        let _guard = env_lock().lock().unwrap();
        unsafe {
            std::env::remove_var("EVOLUTION_API_URL");
        }
        assert!(matches!(
            DeliveryConfig::from_env(),
            Err(ConfigError::MissingVar("EVOLUTION_API_URL"))
        ));
    }

    #[test]
    fn malformed_instance_list_is_rejected() {
        let _guard = env_lock().lock().unwrap();
        unsafe {
            std::env::set_var("EVOLUTION_API_URL", "https://gw.example.com");
            std::env::set_var("EVOLUTION_API_INSTANCES", "{not json");
        }
        assert!(matches!(
            DeliveryConfig::from_env(),
            Err(ConfigError::InvalidInstances(_))
        ));
    }
}
