//! # Routing Decision Rules
//!
//! Deterministic synthesis of a [`RoutingDecision`] from the four gathered
//! inputs. Nothing here performs I/O; the engine gathers the inputs and calls
//! [`RoutingPolicy::decide`].
//!
//! ```text
//!  sentiment ──┐
//!              ├── priority ──────────────┐
//!  history ────┘                          │
//!                                         ├── estimated wait
//!  agents ───── available count ──────────┤
//!                                         │
//!  intent ───── department ── specialists ┴── agent type
//! ```
//!
//! ## Priority
//!
//! Rules are checked in order and the first match wins:
//!
//! 1. sentiment below `high_sentiment_threshold` (-0.5) or more than
//!    `high_interaction_threshold` (5) prior interactions: **high**
//! 2. sentiment below `medium_sentiment_threshold` (0) or more than
//!    `medium_interaction_threshold` (2) prior interactions: **medium**
//! 3. otherwise **low**
//!
//! ## Wait time
//!
//! `base × priority multiplier × max(1, capacity − available agents)` in
//! whole minutes, where the available count covers all agents, not only
//! specialists.

use std::collections::BTreeMap;

use crate::config::RoutingConfig;
use crate::types::{
    AgentAvailability, AgentType, CustomerHistory, Department, IntentResult, Priority,
    RoutingDecision, SentimentResult,
};

#[derive(Debug, Clone)]
pub struct RoutingPolicy {
    config: RoutingConfig,
    departments: BTreeMap<String, Department>,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self::new(RoutingConfig::default())
    }
}

impl RoutingPolicy {
    pub fn new(config: RoutingConfig) -> Self {
        let departments = config
            .departments
            .iter()
            .map(|(intent, dept)| (intent.trim().to_lowercase(), *dept))
            .collect();
        Self { config, departments }
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    pub fn priority(&self, sentiment: &SentimentResult, history: &CustomerHistory) -> Priority {
        let c = &self.config;
        if sentiment.score < c.high_sentiment_threshold
            || history.total_interactions > c.high_interaction_threshold
        {
            Priority::High
        } else if sentiment.score < c.medium_sentiment_threshold
            || history.total_interactions > c.medium_interaction_threshold
        {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    /// Case-insensitive intent lookup; unknown intents go to general
    pub fn department(&self, intent: &str) -> Department {
        self.departments
            .get(&intent.trim().to_lowercase())
            .copied()
            .unwrap_or(Department::General)
    }

    pub fn agent_type(&self, department: Department, agents: &[AgentAvailability]) -> AgentType {
        let has_specialist = agents
            .iter()
            .any(|a| a.available && a.specialization == department.as_str());
        if has_specialist {
            AgentType::Specialist
        } else {
            AgentType::General
        }
    }

    /// Minutes; non-increasing in `available_agents` and never below `base × multiplier`
    pub fn estimated_wait(&self, priority: Priority, available_agents: usize) -> u32 {
        let c = &self.config;
        let priority_multiplier = match priority {
            Priority::High => c.high_priority_multiplier,
            Priority::Medium => c.medium_priority_multiplier,
            Priority::Low => c.low_priority_multiplier,
        };
        let available = u32::try_from(available_agents).unwrap_or(u32::MAX);
        let agent_multiplier = c.agent_capacity.saturating_sub(available).max(1);

        c.base_wait_minutes
            .saturating_mul(priority_multiplier)
            .saturating_mul(agent_multiplier)
    }

    pub fn decide(
        &self,
        intent: &IntentResult,
        sentiment: &SentimentResult,
        history: &CustomerHistory,
        agents: &[AgentAvailability],
    ) -> RoutingDecision {
        let priority = self.priority(sentiment, history);
        let department = self.department(&intent.intent);
        let available = agents.iter().filter(|a| a.available).count();

        RoutingDecision {
            priority,
            department,
            agent_type: self.agent_type(department, agents),
            estimated_wait_time: self.estimated_wait(priority, available),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SentimentLabel;

    fn sentiment(score: f64) -> SentimentResult {
        SentimentResult::new(score, SentimentLabel::from_score(score), 0.9)
    }

    fn history(total: u64) -> CustomerHistory {
        CustomerHistory {
            total_interactions: total,
            ..CustomerHistory::default()
        }
    }

    fn agent(id: &str, available: bool, specialization: &str) -> AgentAvailability {
        AgentAvailability {
            id: id.to_string(),
            name: id.to_string(),
            available,
            specialization: specialization.to_string(),
        }
    }

    #[test]
    fn sentiment_rule_fires_before_history() {
        let policy = RoutingPolicy::default();
        assert_eq!(policy.priority(&sentiment(-0.6), &history(1)), Priority::High);
    }

    #[test]
    fn long_history_is_high_even_when_mildly_negative() {
        let policy = RoutingPolicy::default();
        assert_eq!(policy.priority(&sentiment(-0.2), &history(6)), Priority::High);
    }

    #[test]
    fn priority_boundaries() {
        let policy = RoutingPolicy::default();
        assert_eq!(policy.priority(&sentiment(-0.5), &history(0)), Priority::Medium);
        assert_eq!(policy.priority(&sentiment(-0.01), &history(0)), Priority::Medium);
        assert_eq!(policy.priority(&sentiment(0.0), &history(3)), Priority::Medium);
        assert_eq!(policy.priority(&sentiment(0.0), &history(2)), Priority::Low);
        assert_eq!(policy.priority(&sentiment(0.4), &history(5)), Priority::Medium);
    }

    #[test]
    fn department_lookup_ignores_case() {
        let policy = RoutingPolicy::default();
        assert_eq!(policy.department("BILLING"), Department::Finance);
        assert_eq!(policy.department("Technical"), Department::Support);
        assert_eq!(policy.department("complaint"), Department::Support);
        assert_eq!(policy.department("sales"), Department::Sales);
        assert_eq!(policy.department("xyz"), Department::General);
        assert_eq!(policy.department(""), Department::General);
    }

    #[test]
    fn specialist_requires_an_available_match() {
        let policy = RoutingPolicy::default();
        let agents = vec![
            agent("a", false, "finance"),
            agent("b", true, "support"),
        ];
        assert_eq!(policy.agent_type(Department::Finance, &agents), AgentType::General);
        assert_eq!(policy.agent_type(Department::Support, &agents), AgentType::Specialist);
        assert_eq!(policy.agent_type(Department::Sales, &[]), AgentType::General);
    }

    #[test]
    fn wait_time_table() {
        let policy = RoutingPolicy::default();
        assert_eq!(policy.estimated_wait(Priority::High, 0), 25);
        assert_eq!(policy.estimated_wait(Priority::Medium, 2), 30);
        assert_eq!(policy.estimated_wait(Priority::Low, 4), 15);
        assert_eq!(policy.estimated_wait(Priority::Low, 5), 15);
        assert_eq!(policy.estimated_wait(Priority::High, 40), 5);
    }

    #[test]
    fn wait_time_never_increases_with_more_agents() {
        let policy = RoutingPolicy::default();
        for priority in [Priority::High, Priority::Medium, Priority::Low] {
            let waits: Vec<u32> = (0..=6).map(|n| policy.estimated_wait(priority, n)).collect();
            assert!(waits.windows(2).all(|w| w[1] <= w[0]), "{:?}: {:?}", priority, waits);
            assert_eq!(policy.estimated_wait(priority, 3), policy.estimated_wait(priority, 3));
        }
    }

    #[test]
    fn wait_time_counts_all_available_agents() {
        let policy = RoutingPolicy::default();
        let agents = vec![
            agent("a", true, "sales"),
            agent("b", true, "general"),
            agent("c", false, "finance"),
        ];
        let decision = policy.decide(
            &IntentResult::new("billing", 0.9),
            &sentiment(0.5),
            &history(0),
            &agents,
        );
        assert_eq!(decision.department, Department::Finance);
        assert_eq!(decision.agent_type, AgentType::General);
        assert_eq!(decision.priority, Priority::Low);
        // 5 * 3 * (5 - 2)
        assert_eq!(decision.estimated_wait_time, 45);
    }

    #[test]
    fn custom_department_table() {
        let mut config = RoutingConfig::default();
        config.departments.insert("Refund".to_string(), Department::Finance);
        let policy = RoutingPolicy::new(config);
        assert_eq!(policy.department("refund"), Department::Finance);
    }
}
