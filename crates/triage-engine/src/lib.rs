//! # Triage-Engine
//!
//! Inbound call triage for a contact center.
//!
//! For each caller utterance this crate:
//! - classifies intent and scores sentiment
//! - summarizes the caller's previous interactions
//! - reads the agent roster for availability
//! - picks priority, department, agent type and an estimated wait
//! - proposes next-best actions for the agent
//! - appends the interaction to a durable log
//!
//! ## Architecture
//!
//! Every outside dependency sits behind a trait ([`IntentClassifier`],
//! [`SentimentAnalyzer`], [`HistoryStore`], [`AgentDirectory`],
//! [`SuggestionGenerator`], [`InteractionStore`]) and is injected through
//! [`TriageEngineBuilder`]. Model-backed implementations talk to an
//! OpenAI-compatible endpoint; offline ones need no network. Storage comes
//! in SQLite ([`TriageDatabase`]) and in-memory ([`InMemoryStore`]) flavours.
//!
//! The routing rules themselves live in [`RoutingPolicy`] and are pure.

pub mod agents;
pub mod analysis;
pub mod api;
pub mod config;
pub mod database;
pub mod engine;
pub mod error;
pub mod history;
pub mod logging;
pub mod memory;
pub mod openai;
pub mod responses;
pub mod routing;
pub mod suggestions;
pub mod types;

pub use agents::{AgentDirectory, AvailabilityResolver};
pub use analysis::{
    IntentClassifier, KeywordIntentClassifier, LexiconSentimentAnalyzer, OpenAiIntentClassifier,
    OpenAiSentimentAnalyzer, SentimentAnalyzer,
};
pub use config::{PersistenceMode, TriageConfig};
pub use database::TriageDatabase;
pub use engine::{TriageEngine, TriageEngineBuilder};
pub use error::{Result, Stage, TriageError};
pub use history::{aggregate_history, HistoryAggregator, HistoryStore, InteractionStore};
pub use memory::InMemoryStore;
pub use openai::OpenAiClient;
pub use routing::RoutingPolicy;
pub use suggestions::{
    OpenAiSuggestionGenerator, PlaybookSuggestionGenerator, SuggestionContext, SuggestionGenerator,
};

pub mod prelude {
    pub use crate::agents::AgentDirectory;
    pub use crate::analysis::{IntentClassifier, SentimentAnalyzer};
    pub use crate::config::TriageConfig;
    pub use crate::database::TriageDatabase;
    pub use crate::engine::{TriageEngine, TriageEngineBuilder};
    pub use crate::error::{Result, Stage, TriageError};
    pub use crate::history::{HistoryStore, InteractionStore};
    pub use crate::memory::InMemoryStore;
    pub use crate::suggestions::SuggestionGenerator;
    pub use crate::types::{
        AgentAvailability, AgentSuggestion, AgentType, CustomerHistory, Degradation, Department,
        IntentResult, Priority, RouteRequest, RoutingDecision, SentimentLabel, SentimentResult,
        TriageOutcome,
    };
}
