use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stage of a routing invocation that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Intent,
    Sentiment,
    History,
    Availability,
    Suggestions,
    Persistence,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Intent => "intent",
            Stage::Sentiment => "sentiment",
            Stage::History => "history",
            Stage::Availability => "availability",
            Stage::Suggestions => "suggestions",
            Stage::Persistence => "persistence",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Call triage errors
///
/// Every variant returned from a routing invocation is fatal for that
/// invocation: no decision is produced and no interaction is written.
/// Non-fatal conditions (suggestions, persistence) are reported through
/// [`crate::types::Degradation`] on a successful outcome instead.
#[derive(Error, Debug)]
pub enum TriageError {
    /// Request failed validation before any collaborator was called
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Intent or sentiment classification failed
    #[error("Analysis failed ({stage}): {message}")]
    Analysis { stage: Stage, message: String },

    /// Customer history lookup failed
    #[error("History lookup failed: {0}")]
    History(String),

    /// Agent roster lookup failed
    #[error("Availability lookup failed: {0}")]
    Availability(String),

    /// A collaborator did not answer within its configured timeout
    #[error("Operation timed out: {stage}")]
    Timeout { stage: Stage },

    /// The invoking call went away before routing completed
    #[error("Routing cancelled")]
    Cancelled,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TriageError {
    /// Create a new Analysis error
    pub fn analysis<S: Into<String>>(stage: Stage, msg: S) -> Self {
        Self::Analysis {
            stage,
            message: msg.into(),
        }
    }

    /// Create a new History error
    pub fn history<S: Into<String>>(msg: S) -> Self {
        Self::History(msg.into())
    }

    /// Create a new Availability error
    pub fn availability<S: Into<String>>(msg: S) -> Self {
        Self::Availability(msg.into())
    }

    /// Create a new InvalidInput error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new Config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new Internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// The routing stage this error belongs to, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Analysis { stage, .. } | Self::Timeout { stage } => Some(*stage),
            Self::History(_) => Some(Stage::History),
            Self::Availability(_) => Some(Stage::Availability),
            _ => None,
        }
    }

    /// Whether this error came out of a collaborator during routing
    ///
    /// The calling layer uses this to pick its generic fallback response.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            Self::Analysis { .. } | Self::History(_) | Self::Availability(_) | Self::Timeout { .. }
        )
    }

    /// Whether this error can come out of a routing invocation
    ///
    /// All such errors abort the invocation; setup and store errors are
    /// reported outside routing.
    pub fn is_fatal_for_routing(&self) -> bool {
        self.is_collaborator_failure() || matches!(self, Self::InvalidInput(_) | Self::Cancelled)
    }
}

/// Result type for call triage operations
pub type Result<T> = std::result::Result<T, TriageError>;
