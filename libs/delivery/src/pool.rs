//! Round-robin selection over the configured gateway instances.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::{ConfigError, GatewayCredential};

/// Shared pool of gateway credentials with an advancing cursor.
///
/// One pool is built at startup and handed to the delivery service; the
/// cursor advances atomically so concurrent sends never race on it. Strict
/// fairness is not a goal, freedom from cursor data races is.
pub struct InstancePool {
    instances: Vec<GatewayCredential>,
    cursor: AtomicUsize,
}

impl InstancePool {
    /// Fails fast when no instance is configured: better a startup error
    /// than a guaranteed failure on the first send.
    pub fn new(instances: Vec<GatewayCredential>) -> Result<Self, ConfigError> {
        if instances.is_empty() {
            return Err(ConfigError::NoInstances);
        }
        Ok(Self {
            instances,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Returns the credential at the cursor and advances it.
    pub fn next(&self) -> GatewayCredential {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.instances.len();
        self.instances[index].clone()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
