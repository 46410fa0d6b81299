//! Customer history and the interaction log
//!
//! The interaction log is append-only: the engine writes one
//! [`InteractionRecord`] per routed call turn and the history aggregator reads
//! them back for later calls from the same caller. Nothing is cached between
//! calls.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::types::{CustomerHistory, InteractionRecord, PastInteraction};

/// Append side of the interaction log
#[async_trait]
pub trait InteractionStore: Send + Sync {
    async fn append(&self, record: &InteractionRecord) -> Result<()>;
}

/// Read side of the interaction log
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// All past interactions of a caller, oldest first; empty for unknown callers
    async fn interactions_for(&self, caller_id: &str) -> Result<Vec<PastInteraction>>;
}

/// Fold past interactions into a history snapshot
///
/// Interactions are expected oldest first; `previous_issues` keeps the order
/// in which each intent first appeared.
pub fn aggregate_history(interactions: &[PastInteraction]) -> CustomerHistory {
    let last_interaction = interactions.iter().map(|i| i.created_at).max();

    let scores: Vec<f64> = interactions
        .iter()
        .filter_map(|i| i.sentiment_score)
        .filter(|s| s.is_finite())
        .collect();
    let average_sentiment = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };

    let mut previous_issues: Vec<String> = Vec::new();
    for intent in interactions.iter().filter_map(|i| i.intent.as_deref()) {
        if !previous_issues.iter().any(|seen| seen == intent) {
            previous_issues.push(intent.to_string());
        }
    }

    CustomerHistory {
        total_interactions: interactions.len() as u64,
        last_interaction,
        average_sentiment,
        previous_issues,
    }
}

/// Customer history aggregator over a [`HistoryStore`]
#[derive(Clone)]
pub struct HistoryAggregator {
    store: Arc<dyn HistoryStore>,
}

impl HistoryAggregator {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self { store }
    }

    pub async fn fetch_history(&self, caller_id: &str) -> Result<CustomerHistory> {
        let interactions = self.store.interactions_for(caller_id).await?;
        let history = aggregate_history(&interactions);
        debug!(
            "History for {}: {} interactions, avg sentiment {:.2}",
            caller_id, history.total_interactions, history.average_sentiment
        );
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn past(minutes: i64, intent: Option<&str>, score: Option<f64>) -> PastInteraction {
        PastInteraction {
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes),
            intent: intent.map(str::to_string),
            sentiment_score: score,
        }
    }

    #[test]
    fn empty_history_is_zero_valued() {
        let history = aggregate_history(&[]);
        assert_eq!(history, CustomerHistory::default());
        assert_eq!(history.average_sentiment, 0.0);
        assert!(history.last_interaction.is_none());
    }

    #[test]
    fn average_ignores_interactions_without_sentiment() {
        let history = aggregate_history(&[
            past(0, Some("billing"), Some(-0.5)),
            past(5, None, None),
            past(10, Some("technical"), Some(0.3)),
        ]);
        assert_eq!(history.total_interactions, 3);
        assert!((history.average_sentiment - (-0.1)).abs() < 1e-9);
    }

    #[test]
    fn no_scores_means_zero_not_nan() {
        let history = aggregate_history(&[past(0, Some("sales"), None)]);
        assert_eq!(history.average_sentiment, 0.0);
    }

    #[test]
    fn issues_are_distinct_in_first_seen_order() {
        let history = aggregate_history(&[
            past(0, Some("billing"), None),
            past(1, Some("technical"), None),
            past(2, Some("billing"), None),
            past(3, Some("complaint"), None),
        ]);
        assert_eq!(history.previous_issues, vec!["billing", "technical", "complaint"]);
    }

    #[test]
    fn last_interaction_is_the_latest_timestamp() {
        let history = aggregate_history(&[past(30, None, None), past(90, None, None), past(60, None, None)]);
        assert_eq!(history.last_interaction, Some(past(90, None, None).created_at));
    }
}
