use async_trait::async_trait;
use sqlx::Row;
use tracing::{debug, info};

use super::TriageDatabase;
use crate::agents::AgentDirectory;
use crate::error::Result;
use crate::types::RosterEntry;

impl TriageDatabase {
    /// Insert or update a roster entry; the active call count is left as is
    pub async fn upsert_agent(
        &self,
        id: &str,
        name: &str,
        role: &str,
        specialization: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO agents (id, name, role, specialization, active_calls)
            VALUES (?, ?, ?, ?, 0)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                role = excluded.role,
                specialization = excluded.specialization
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(role)
        .bind(specialization)
        .execute(self.pool())
        .await?;

        info!("👤 Agent {} saved ({}, {})", id, role, specialization.unwrap_or("general"));
        Ok(())
    }

    /// Set the number of in-progress calls; false for an unknown agent
    pub async fn set_active_calls(&self, id: &str, active_calls: u32) -> Result<bool> {
        let result = sqlx::query("UPDATE agents SET active_calls = ? WHERE id = ?")
            .bind(i64::from(active_calls))
            .bind(id)
            .execute(self.pool())
            .await?;

        debug!("Agent {} now has {} active calls", id, active_calls);
        Ok(result.rows_affected() > 0)
    }

    pub async fn remove_agent(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM agents WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whole roster, every role included
    pub async fn list_roster(&self) -> Result<Vec<RosterEntry>> {
        let rows = sqlx::query(
            "SELECT id, name, role, specialization, active_calls FROM agents ORDER BY id",
        )
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| -> Result<RosterEntry> {
                let active_calls: i64 = row.try_get("active_calls")?;
                Ok(RosterEntry {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    role: row.try_get("role")?,
                    active_calls: u32::try_from(active_calls.max(0)).unwrap_or(u32::MAX),
                    specialization: row.try_get("specialization")?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl AgentDirectory for TriageDatabase {
    async fn roster(&self) -> anyhow::Result<Vec<RosterEntry>> {
        Ok(self.list_roster().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_keeps_active_calls() {
        let db = TriageDatabase::new_in_memory().await.unwrap();
        db.upsert_agent("alice", "Alice", "agent", Some("finance")).await.unwrap();
        assert!(db.set_active_calls("alice", 1).await.unwrap());
        db.upsert_agent("alice", "Alice Jones", "agent", Some("support")).await.unwrap();

        let roster = db.list_roster().await.unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].name, "Alice Jones");
        assert_eq!(roster[0].active_calls, 1);
        assert_eq!(roster[0].specialization.as_deref(), Some("support"));
    }

    #[tokio::test]
    async fn unknown_agents_are_reported() {
        let db = TriageDatabase::new_in_memory().await.unwrap();
        assert!(!db.set_active_calls("ghost", 1).await.unwrap());
        assert!(!db.remove_agent("ghost").await.unwrap());
    }

    #[tokio::test]
    async fn roster_includes_non_agents() {
        let db = TriageDatabase::new_in_memory().await.unwrap();
        db.upsert_agent("bob", "Bob", "supervisor", None).await.unwrap();
        db.upsert_agent("carol", "Carol", "agent", None).await.unwrap();

        let roster = db.roster().await.unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].role, "supervisor");
        assert!(roster[1].specialization.is_none());
    }
}
