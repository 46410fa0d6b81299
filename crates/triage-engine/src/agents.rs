//! Agent availability
//!
//! The roster is read fresh for every decision. No agent is reserved here;
//! final assignment happens downstream, so two concurrent calls may both see
//! the same agent as available.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::types::{AgentAvailability, RosterEntry};

/// Role that marks a roster entry as a call-taking agent
pub const AGENT_ROLE: &str = "agent";

/// Specialization assumed for agents that have none recorded
pub const DEFAULT_SPECIALIZATION: &str = "general";

/// Source of the agent roster
#[async_trait]
pub trait AgentDirectory: Send + Sync {
    async fn roster(&self) -> Result<Vec<RosterEntry>>;
}

impl From<&RosterEntry> for AgentAvailability {
    fn from(entry: &RosterEntry) -> Self {
        AgentAvailability {
            id: entry.id.clone(),
            name: entry.name.clone(),
            available: entry.active_calls == 0,
            specialization: entry
                .specialization
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(DEFAULT_SPECIALIZATION)
                .to_string(),
        }
    }
}

/// Resolves the roster into per-agent availability
#[derive(Clone)]
pub struct AvailabilityResolver {
    directory: Arc<dyn AgentDirectory>,
}

impl AvailabilityResolver {
    pub fn new(directory: Arc<dyn AgentDirectory>) -> Self {
        Self { directory }
    }

    /// Every entry with the agent role; available iff it has no call in progress
    pub async fn list_agents(&self) -> Result<Vec<AgentAvailability>> {
        let roster = self.directory.roster().await?;
        let agents: Vec<AgentAvailability> = roster
            .iter()
            .filter(|entry| entry.role.eq_ignore_ascii_case(AGENT_ROLE))
            .map(AgentAvailability::from)
            .collect();

        debug!(
            "Roster: {} agents, {} available",
            agents.len(),
            agents.iter().filter(|a| a.available).count()
        );
        Ok(agents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRoster(Vec<RosterEntry>);

    #[async_trait]
    impl AgentDirectory for FixedRoster {
        async fn roster(&self) -> Result<Vec<RosterEntry>> {
            Ok(self.0.clone())
        }
    }

    fn entry(id: &str, role: &str, active_calls: u32, specialization: Option<&str>) -> RosterEntry {
        RosterEntry {
            id: id.to_string(),
            name: id.to_uppercase(),
            role: role.to_string(),
            active_calls,
            specialization: specialization.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn only_agents_are_listed() {
        let resolver = AvailabilityResolver::new(Arc::new(FixedRoster(vec![
            entry("alice", "agent", 0, Some("finance")),
            entry("bob", "ADMIN", 0, None),
            entry("carol", "Agent", 2, Some("support")),
        ])));

        let agents = resolver.list_agents().await.unwrap();
        assert_eq!(agents.len(), 2);
        assert!(agents[0].available);
        assert_eq!(agents[0].specialization, "finance");
        assert!(!agents[1].available);
    }

    #[tokio::test]
    async fn missing_specialization_defaults_to_general() {
        let resolver = AvailabilityResolver::new(Arc::new(FixedRoster(vec![
            entry("dave", "agent", 0, None),
            entry("erin", "agent", 0, Some("  ")),
        ])));

        let agents = resolver.list_agents().await.unwrap();
        assert!(agents.iter().all(|a| a.specialization == DEFAULT_SPECIALIZATION));
    }

    #[tokio::test]
    async fn directory_errors_propagate() {
        struct Down;

        #[async_trait]
        impl AgentDirectory for Down {
            async fn roster(&self) -> Result<Vec<RosterEntry>> {
                anyhow::bail!("roster unreachable")
            }
        }

        let resolver = AvailabilityResolver::new(Arc::new(Down));
        assert!(resolver.list_agents().await.is_err());
    }
}
