//! Outbound delivery through the Evolution API.
//!
//! Composes phone normalization, round-robin instance selection, and a
//! retrying HTTP sender into the delivery operations the attendant uses:
//! text messages, list menus, and number verification. Every operation
//! resolves to a [`DeliveryOutcome`]; failures never escape as panics or
//! raw errors past this crate's boundary.

pub mod client;
pub mod config;
pub mod outcome;
pub mod phone;
pub mod pool;
pub mod service;

pub use client::ResilientClient;
pub use config::{ConfigError, DeliveryConfig, GatewayCredential};
pub use outcome::{DeliveryOutcome, DeliveryStatus};
pub use phone::{DialPlan, normalize_msisdn};
pub use pool::InstancePool;
pub use service::{DeliveryService, valid_subset};
