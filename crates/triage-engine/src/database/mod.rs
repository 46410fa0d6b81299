//! # Triage Database
//!
//! SQLite persistence for the interaction log and the agent roster, using
//! sqlx with a small connection pool.
//!
//! - [`schema`]: table and index definitions
//! - [`interactions`]: append and history queries
//! - [`agents`]: roster maintenance and lookup

pub mod agents;
pub mod interactions;
pub mod schema;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, error, info};

use crate::config::DatabaseConfig;
use crate::error::Result;

/// Triage database manager
#[derive(Clone, Debug)]
pub struct TriageDatabase {
    pool: SqlitePool,
}

impl TriageDatabase {
    /// Open (creating if needed) the database at `url` and initialize the schema
    pub async fn new(url: &str, max_connections: u32) -> Result<Self> {
        info!("🗄️ Opening triage database at: {}", url);
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        Self::open(SqlitePoolOptions::new().max_connections(max_connections), options).await
    }

    pub async fn from_config(config: &DatabaseConfig) -> Result<Self> {
        Self::new(&config.url, config.max_connections).await
    }

    /// In-memory database for tests
    ///
    /// Every SQLite memory connection is its own database, so the pool keeps
    /// exactly one connection open for its whole life.
    pub async fn new_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool_options = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
        Self::open(pool_options, options).await
    }

    async fn open(pool_options: SqlitePoolOptions, options: SqliteConnectOptions) -> Result<Self> {
        let pool = pool_options.connect_with(options).await?;

        let database = Self { pool };
        database.initialize_schema().await?;

        info!("✅ Triage database ready");
        Ok(database)
    }

    async fn initialize_schema(&self) -> Result<()> {
        debug!("📋 Creating triage database schema");
        schema::create_interactions_table(&self.pool).await?;
        schema::create_agents_table(&self.pool).await?;
        schema::create_indexes(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn health_check(&self) -> bool {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                error!("❌ Database health check failed: {}", e);
                false
            }
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
