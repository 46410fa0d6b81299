use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::TriageDatabase;
use crate::error::{Result, TriageError};
use crate::history::{HistoryStore, InteractionStore};
use crate::types::{Direction, InteractionKind, InteractionRecord, PastInteraction};

/// Fixed-width UTC timestamps so text ordering matches time ordering
fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| TriageError::internal(format!("Bad stored timestamp '{}': {}", text, e)))
}

impl TriageDatabase {
    pub async fn insert_interaction(&self, record: &InteractionRecord) -> Result<()> {
        let metadata = serde_json::to_string(&record.metadata)?;
        let triage = record.metadata.triage();

        sqlx::query(
            r#"
            INSERT INTO interactions
                (id, caller_id, kind, direction, content, intent, sentiment_score, metadata, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.caller_id.as_str())
        .bind("CALL")
        .bind("INBOUND")
        .bind(record.content.as_str())
        .bind(triage.map(|t| t.intent.intent.as_str()))
        .bind(triage.map(|t| t.sentiment.score))
        .bind(metadata)
        .bind(encode_timestamp(&record.created_at))
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// History view of a caller's interactions, oldest first
    pub async fn past_interactions(&self, caller_id: &str) -> Result<Vec<PastInteraction>> {
        let rows = sqlx::query(
            "SELECT intent, sentiment_score, created_at FROM interactions
             WHERE caller_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(caller_id)
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| -> Result<PastInteraction> {
                let created_at: String = row.try_get("created_at")?;
                Ok(PastInteraction {
                    created_at: decode_timestamp(&created_at)?,
                    intent: row.try_get("intent")?,
                    sentiment_score: row.try_get("sentiment_score")?,
                })
            })
            .collect()
    }

    /// Full records of a caller, oldest first
    pub async fn interactions_for_caller(&self, caller_id: &str) -> Result<Vec<InteractionRecord>> {
        let rows = sqlx::query(
            "SELECT id, caller_id, content, metadata, created_at FROM interactions
             WHERE caller_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(caller_id)
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| -> Result<InteractionRecord> {
                let id: String = row.try_get("id")?;
                let metadata: String = row.try_get("metadata")?;
                let created_at: String = row.try_get("created_at")?;
                Ok(InteractionRecord {
                    id: Uuid::parse_str(&id)
                        .map_err(|e| TriageError::internal(format!("Bad stored id '{}': {}", id, e)))?,
                    caller_id: row.try_get("caller_id")?,
                    kind: InteractionKind::Call,
                    direction: Direction::Inbound,
                    content: row.try_get("content")?,
                    metadata: serde_json::from_str(&metadata)?,
                    created_at: decode_timestamp(&created_at)?,
                })
            })
            .collect()
    }

    pub async fn count_interactions(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM interactions")
            .fetch_one(self.pool())
            .await?;
        Ok(row.try_get("n")?)
    }
}

#[async_trait]
impl InteractionStore for TriageDatabase {
    async fn append(&self, record: &InteractionRecord) -> anyhow::Result<()> {
        Ok(self.insert_interaction(record).await?)
    }
}

#[async_trait]
impl HistoryStore for TriageDatabase {
    async fn interactions_for(&self, caller_id: &str) -> anyhow::Result<Vec<PastInteraction>> {
        Ok(self.past_interactions(caller_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AgentType, Department, IntentResult, Priority, RoutingDecision, SentimentLabel,
        SentimentResult, TriageMetadata, VoicemailMetadata,
    };

    fn record(caller: &str, intent: &str, score: f64) -> InteractionRecord {
        InteractionRecord::inbound_call(
            caller,
            format!("about {}", intent),
            TriageMetadata {
                intent: IntentResult::new(intent, 0.8),
                sentiment: SentimentResult::new(score, SentimentLabel::from_score(score), 0.7),
                routing: RoutingDecision {
                    priority: Priority::Medium,
                    department: Department::General,
                    agent_type: AgentType::General,
                    estimated_wait_time: 10,
                },
                suggestions: vec![],
            },
        )
    }

    #[test]
    fn timestamps_round_trip() {
        let now = Utc::now();
        let decoded = decode_timestamp(&encode_timestamp(&now)).unwrap();
        assert_eq!(decoded.timestamp_micros(), now.timestamp_micros());
    }

    #[tokio::test]
    async fn records_are_scoped_to_caller() {
        let db = TriageDatabase::new_in_memory().await.unwrap();
        db.insert_interaction(&record("+1000", "billing", -0.4)).await.unwrap();
        db.insert_interaction(&record("+1000", "technical", 0.2)).await.unwrap();
        db.insert_interaction(&record("+2000", "sales", 0.9)).await.unwrap();

        let past = db.past_interactions("+1000").await.unwrap();
        assert_eq!(past.len(), 2);
        assert_eq!(past[0].intent.as_deref(), Some("billing"));
        assert_eq!(past[1].sentiment_score, Some(0.2));
        assert!(db.past_interactions("+3000").await.unwrap().is_empty());
        assert_eq!(db.count_interactions().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn full_records_keep_metadata() {
        let db = TriageDatabase::new_in_memory().await.unwrap();
        let original = record("+1000", "complaint", -0.9);
        db.insert_interaction(&original).await.unwrap();

        let stored = db.interactions_for_caller("+1000").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, original.id);
        assert_eq!(stored[0].metadata, original.metadata);
    }

    #[tokio::test]
    async fn voicemail_rows_have_no_intent_or_score() {
        let db = TriageDatabase::new_in_memory().await.unwrap();
        db.insert_interaction(&record("+1000", "sales", 0.5)).await.unwrap();
        let voicemail = InteractionRecord::voicemail(
            "+1000",
            VoicemailMetadata {
                call_sid: "CA3".to_string(),
                recording_url: "https://recordings.example/RE3".to_string(),
                recording_duration: None,
            },
        );
        db.insert_interaction(&voicemail).await.unwrap();

        let past = db.past_interactions("+1000").await.unwrap();
        assert_eq!(past.len(), 2);
        assert!(past[1].intent.is_none());
        assert!(past[1].sentiment_score.is_none());

        let stored = db.interactions_for_caller("+1000").await.unwrap();
        assert_eq!(stored[1].metadata, voicemail.metadata);
        assert_eq!(stored[1].content, "Voice message");
    }
}
