//! Stub collaborators shared by the integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use triage_engine::prelude::*;
use triage_engine::types::{InteractionRecord, PastInteraction};

/// Intent classifier that always answers the same
pub struct FixedIntent(pub IntentResult);

#[async_trait]
impl IntentClassifier for FixedIntent {
    async fn classify_intent(&self, _transcript: &str) -> Result<IntentResult> {
        Ok(self.0.clone())
    }
}

/// Sentiment analyzer that always answers the same
pub struct FixedSentiment(pub SentimentResult);

impl FixedSentiment {
    pub fn score(score: f64) -> Self {
        Self(SentimentResult::new(score, SentimentLabel::from_score(score), 0.9))
    }
}

#[async_trait]
impl SentimentAnalyzer for FixedSentiment {
    async fn analyze_sentiment(&self, _transcript: &str) -> Result<SentimentResult> {
        Ok(self.0.clone())
    }
}

pub struct FailingIntent;

#[async_trait]
impl IntentClassifier for FailingIntent {
    async fn classify_intent(&self, _transcript: &str) -> Result<IntentResult> {
        bail!("model endpoint unreachable")
    }
}

pub struct FailingSentiment;

#[async_trait]
impl SentimentAnalyzer for FailingSentiment {
    async fn analyze_sentiment(&self, _transcript: &str) -> Result<SentimentResult> {
        bail!("sentiment response missing score")
    }
}

pub struct FailingHistory;

#[async_trait]
impl HistoryStore for FailingHistory {
    async fn interactions_for(&self, _caller_id: &str) -> Result<Vec<PastInteraction>> {
        bail!("interaction table locked")
    }
}

/// Roster lookup that errors straight away
pub struct FailingDirectory;

#[async_trait]
impl AgentDirectory for FailingDirectory {
    async fn roster(&self) -> Result<Vec<triage_engine::types::RosterEntry>> {
        bail!("agent roster unavailable")
    }
}

/// Roster lookup that never answers in time
pub struct SlowDirectory(pub Duration);

#[async_trait]
impl AgentDirectory for SlowDirectory {
    async fn roster(&self) -> Result<Vec<triage_engine::types::RosterEntry>> {
        tokio::time::sleep(self.0).await;
        Ok(Vec::new())
    }
}

/// History that is already `count` interactions long
pub struct PriorCalls {
    pub count: usize,
    pub intent: &'static str,
    pub score: f64,
}

#[async_trait]
impl HistoryStore for PriorCalls {
    async fn interactions_for(&self, _caller_id: &str) -> Result<Vec<PastInteraction>> {
        let start = Utc::now() - ChronoDuration::days(30);
        Ok((0..self.count)
            .map(|i| PastInteraction {
                created_at: start + ChronoDuration::days(i as i64),
                intent: Some(self.intent.to_string()),
                sentiment_score: Some(self.score),
            })
            .collect())
    }
}

pub struct FailingSuggestions;

#[async_trait]
impl SuggestionGenerator for FailingSuggestions {
    async fn generate(
        &self,
        _context: &triage_engine::SuggestionContext,
    ) -> Result<Vec<AgentSuggestion>> {
        bail!("suggestion response was not JSON")
    }
}

/// Interaction log that rejects every write but counts attempts
#[derive(Default)]
pub struct FailingLog {
    pub attempts: AtomicUsize,
}

impl FailingLog {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InteractionStore for FailingLog {
    async fn append(&self, _record: &InteractionRecord) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        bail!("disk full")
    }
}

/// Roster with two finance agents, one of them busy, and a support agent
pub fn staffed_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store.upsert_agent("alice", "Alice", "agent", Some("finance"));
    store.upsert_agent("bob", "Bob", "agent", Some("finance"));
    store.upsert_agent("carol", "Carol", "agent", Some("support"));
    store.upsert_agent("dave", "Dave", "supervisor", Some("support"));
    store.set_active_calls("bob", 1);
    store
}

/// Engine over `store` with fixed intent and sentiment answers
pub fn scripted_engine(
    store: Arc<InMemoryStore>,
    intent: &str,
    score: f64,
) -> TriageEngineBuilder {
    TriageEngine::builder()
        .with_offline_analyzers()
        .with_store(store)
        .with_intent_classifier(Arc::new(FixedIntent(IntentResult::new(intent, 0.9))))
        .with_sentiment_analyzer(Arc::new(FixedSentiment::score(score)))
}
