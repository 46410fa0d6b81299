//! Database schema definitions for the triage store

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::Result;

/// Create the interaction log table
///
/// `intent` and `sentiment_score` duplicate fields of `metadata` so history
/// queries need not parse JSON.
pub async fn create_interactions_table(pool: &SqlitePool) -> Result<()> {
    debug!("📋 Creating interactions table");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS interactions (
            id TEXT PRIMARY KEY,
            caller_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            direction TEXT NOT NULL,
            content TEXT NOT NULL,
            intent TEXT,
            sentiment_score REAL,
            metadata TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the agent roster table
pub async fn create_agents_table(pool: &SqlitePool) -> Result<()> {
    debug!("📋 Creating agents table");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS agents (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'agent',
            specialization TEXT,
            active_calls INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_indexes(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_interactions_caller ON interactions(caller_id, created_at)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_agents_role ON agents(role)")
        .execute(pool)
        .await?;

    Ok(())
}
