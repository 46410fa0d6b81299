//! In-process interaction log and roster
//!
//! Backs offline runs and tests. Contents are lost when the process exits.

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;

use crate::agents::AgentDirectory;
use crate::history::{HistoryStore, InteractionStore};
use crate::types::{InteractionRecord, PastInteraction, RosterEntry};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    /// Records per caller, in append order
    interactions: DashMap<String, Vec<InteractionRecord>>,
    roster: RwLock<Vec<RosterEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a roster entry, keeping its active call count
    pub fn upsert_agent(&self, id: &str, name: &str, role: &str, specialization: Option<&str>) {
        let mut roster = self.roster.write();
        match roster.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.name = name.to_string();
                entry.role = role.to_string();
                entry.specialization = specialization.map(str::to_string);
            }
            None => roster.push(RosterEntry {
                id: id.to_string(),
                name: name.to_string(),
                role: role.to_string(),
                active_calls: 0,
                specialization: specialization.map(str::to_string),
            }),
        }
    }

    /// Returns false for an unknown agent
    pub fn set_active_calls(&self, id: &str, active_calls: u32) -> bool {
        let mut roster = self.roster.write();
        match roster.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.active_calls = active_calls;
                true
            }
            None => false,
        }
    }

    pub fn remove_agent(&self, id: &str) -> bool {
        let mut roster = self.roster.write();
        let before = roster.len();
        roster.retain(|e| e.id != id);
        roster.len() != before
    }

    pub fn interaction_count(&self) -> usize {
        self.interactions.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn interactions_for_caller(&self, caller_id: &str) -> Vec<InteractionRecord> {
        self.interactions
            .get(caller_id)
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl InteractionStore for InMemoryStore {
    async fn append(&self, record: &InteractionRecord) -> Result<()> {
        self.interactions
            .entry(record.caller_id.clone())
            .or_default()
            .push(record.clone());
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for InMemoryStore {
    async fn interactions_for(&self, caller_id: &str) -> Result<Vec<PastInteraction>> {
        let mut past: Vec<PastInteraction> = self
            .interactions
            .get(caller_id)
            .map(|records| records.iter().map(InteractionRecord::as_past_interaction).collect())
            .unwrap_or_default();
        past.sort_by_key(|p| p.created_at);
        Ok(past)
    }
}

#[async_trait]
impl AgentDirectory for InMemoryStore {
    async fn roster(&self) -> Result<Vec<RosterEntry>> {
        Ok(self.roster.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn roster_updates_in_place() {
        let store = InMemoryStore::new();
        store.upsert_agent("alice", "Alice", "agent", Some("sales"));
        store.upsert_agent("alice", "Alice B", "agent", Some("finance"));
        assert!(store.set_active_calls("alice", 2));
        assert!(!store.set_active_calls("nobody", 1));

        let roster = store.roster().await.unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].name, "Alice B");
        assert_eq!(roster[0].active_calls, 2);
        assert_eq!(roster[0].specialization.as_deref(), Some("finance"));

        assert!(store.remove_agent("alice"));
        assert!(store.roster().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_caller_has_no_interactions() {
        let store = InMemoryStore::new();
        assert!(store.interactions_for("+15550199").await.unwrap().is_empty());
    }
}
