use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};
use crate::logging::LoggingConfig;
use crate::types::Department;

/// Call triage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    /// Priority, department and wait-time rules
    pub routing: RoutingConfig,

    /// Per-stage collaborator timeouts
    pub timeouts: TimeoutConfig,

    /// Model provider settings
    pub openai: OpenAiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Routing rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Sentiment below this is high priority
    pub high_sentiment_threshold: f64,

    /// More prior interactions than this is high priority
    pub high_interaction_threshold: u64,

    /// Sentiment below this is medium priority
    pub medium_sentiment_threshold: f64,

    /// More prior interactions than this is medium priority
    pub medium_interaction_threshold: u64,

    /// Base wait in minutes before multipliers
    pub base_wait_minutes: u32,

    pub high_priority_multiplier: u32,
    pub medium_priority_multiplier: u32,
    pub low_priority_multiplier: u32,

    /// Available-agent count at which the agent multiplier bottoms out at 1
    pub agent_capacity: u32,

    /// Intent label (lowercase) to department
    pub departments: BTreeMap<String, Department>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        let departments = [
            ("billing", Department::Finance),
            ("technical", Department::Support),
            ("sales", Department::Sales),
            ("complaint", Department::Support),
            ("general", Department::General),
        ]
        .into_iter()
        .map(|(intent, dept)| (intent.to_string(), dept))
        .collect();

        Self {
            high_sentiment_threshold: -0.5,
            high_interaction_threshold: 5,
            medium_sentiment_threshold: 0.0,
            medium_interaction_threshold: 2,
            base_wait_minutes: 5,
            high_priority_multiplier: 1,
            medium_priority_multiplier: 2,
            low_priority_multiplier: 3,
            agent_capacity: 5,
            departments,
        }
    }
}

/// How the interaction write relates to the routing response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceMode {
    /// Await the write (bounded by `persistence_ms`) and report failures on the outcome
    Awaited,
    /// Spawn the write and return immediately; failures only reach the log
    Detached,
}

/// Collaborator timeouts in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub intent_ms: u64,
    pub sentiment_ms: u64,
    pub history_ms: u64,
    pub availability_ms: u64,
    pub suggestions_ms: u64,
    pub persistence_ms: u64,
    pub persistence_mode: PersistenceMode,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            intent_ms: 10_000,
            sentiment_ms: 10_000,
            history_ms: 3_000,
            availability_ms: 3_000,
            suggestions_ms: 15_000,
            persistence_ms: 3_000,
            persistence_mode: PersistenceMode::Awaited,
        }
    }
}

impl TimeoutConfig {
    pub fn intent(&self) -> Duration {
        Duration::from_millis(self.intent_ms)
    }

    pub fn sentiment(&self) -> Duration {
        Duration::from_millis(self.sentiment_ms)
    }

    pub fn history(&self) -> Duration {
        Duration::from_millis(self.history_ms)
    }

    pub fn availability(&self) -> Duration {
        Duration::from_millis(self.availability_ms)
    }

    pub fn suggestions(&self) -> Duration {
        Duration::from_millis(self.suggestions_ms)
    }

    pub fn persistence(&self) -> Duration {
        Duration::from_millis(self.persistence_ms)
    }
}

/// Chat-completions provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub model: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    pub analysis_temperature: f32,
    pub suggestion_temperature: f32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            analysis_temperature: 0.3,
            suggestion_temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx SQLite URL
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://triage.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8090".to_string(),
        }
    }
}

impl TriageConfig {
    /// Parse configuration from TOML text; missing sections take defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: TriageConfig = toml::from_str(text)
            .map_err(|e| TriageError::config(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            TriageError::config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        let routing = &self.routing;
        if routing.high_sentiment_threshold > routing.medium_sentiment_threshold {
            return Err(TriageError::config(
                "high_sentiment_threshold must not exceed medium_sentiment_threshold",
            ));
        }
        if routing.high_interaction_threshold < routing.medium_interaction_threshold {
            return Err(TriageError::config(
                "high_interaction_threshold must not be below medium_interaction_threshold",
            ));
        }
        if routing.base_wait_minutes == 0 {
            return Err(TriageError::config("base_wait_minutes must be positive"));
        }
        if routing.departments.keys().any(|k| k.trim().is_empty()) {
            return Err(TriageError::config("department table has an empty intent key"));
        }

        let t = &self.timeouts;
        let all = [
            ("intent_ms", t.intent_ms),
            ("sentiment_ms", t.sentiment_ms),
            ("history_ms", t.history_ms),
            ("availability_ms", t.availability_ms),
            ("suggestions_ms", t.suggestions_ms),
            ("persistence_ms", t.persistence_ms),
        ];
        if let Some((name, _)) = all.iter().find(|(_, ms)| *ms == 0) {
            return Err(TriageError::config(format!("timeouts.{} must be positive", name)));
        }

        if self.database.max_connections == 0 {
            return Err(TriageError::config("database.max_connections must be positive"));
        }

        crate::logging::parse_log_level(&self.logging.level)?;
        Ok(())
    }
}
