//! Per-caller persistence: client records and conversation history.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Oldest turns are dropped past this point.
const HISTORY_CAP: usize = 40;

/// What the attendant knows about one caller, keyed by phone number.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientRecord {
    pub phone: String,
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    pub chosen_plan: Option<String>,
    pub status: Option<String>,
    pub last_interaction: Option<String>,
}

impl ClientRecord {
    pub fn new(phone: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            ..Default::default()
        }
    }

    /// Fills fields present on `other` into this record.
    fn merge_from(&mut self, other: ClientRecord) {
        macro_rules! take {
            ($field:ident) => {
                if other.$field.is_some() {
                    self.$field = other.$field;
                }
            };
        }
        take!(name);
        take!(cpf);
        take!(city);
        take!(neighborhood);
        take!(chosen_plan);
        take!(status);
    }
}

/// One conversation turn in the shape the completion service consumes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
        }
    }
}

pub type SharedClientStore = Arc<dyn ClientStore>;

#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn get(&self, phone: &str) -> Result<Option<ClientRecord>>;
    /// Merges the given record into the stored one and stamps the
    /// interaction time.
    async fn upsert(&self, record: ClientRecord) -> Result<()>;
    /// The most recent turns, oldest first.
    async fn history(&self, phone: &str, limit: usize) -> Result<Vec<ChatTurn>>;
    async fn append_history(&self, phone: &str, turn: ChatTurn) -> Result<()>;
}

/// In-memory store; the production deployment swaps in the hosted database
/// behind the same trait.
#[derive(Default)]
pub struct MemoryClientStore {
    clients: DashMap<String, ClientRecord>,
    history: DashMap<String, Vec<ChatTurn>>,
}

impl MemoryClientStore {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn shared_memory_store() -> SharedClientStore {
    Arc::new(MemoryClientStore::new())
}

#[async_trait]
impl ClientStore for MemoryClientStore {
    async fn get(&self, phone: &str) -> Result<Option<ClientRecord>> {
        Ok(self.clients.get(phone).map(|entry| entry.value().clone()))
    }

    async fn upsert(&self, record: ClientRecord) -> Result<()> {
        let mut entry = self
            .clients
            .entry(record.phone.clone())
            .or_insert_with(|| ClientRecord::new(record.phone.clone()));
        entry.merge_from(record);
        entry.last_interaction = OffsetDateTime::now_utc().format(&Rfc3339).ok();
        Ok(())
    }

    async fn history(&self, phone: &str, limit: usize) -> Result<Vec<ChatTurn>> {
        let turns = self
            .history
            .get(phone)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        let skip = turns.len().saturating_sub(limit);
        Ok(turns.into_iter().skip(skip).collect())
    }

    async fn append_history(&self, phone: &str, turn: ChatTurn) -> Result<()> {
        let mut turns = self.history.entry(phone.to_string()).or_default();
        turns.push(turn);
        if turns.len() > HISTORY_CAP {
            let excess = turns.len() - HISTORY_CAP;
            turns.drain(..excess);
        }
        Ok(())
    }
}
