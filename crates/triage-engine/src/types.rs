//! Shared data model for call triage
//!
//! Every structure that crosses the engine boundary serializes with camelCase
//! field names so it can be handed straight to the telephony layer.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Clamp a model-provided value into `[lo, hi]`, mapping NaN to `lo.max(0.0)`
pub(crate) fn clamp_unit(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        return lo.max(0.0);
    }
    value.clamp(lo, hi)
}

/// Classified intent of a caller's utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResult {
    pub intent: String,
    pub confidence: f64,
    #[serde(default)]
    pub entities: BTreeMap<String, String>,
}

impl IntentResult {
    pub fn new(intent: impl Into<String>, confidence: f64) -> Self {
        Self {
            intent: intent.into(),
            confidence: clamp_unit(confidence, 0.0, 1.0),
            entities: BTreeMap::new(),
        }
    }

    /// Result used for blank transcripts
    pub fn unclassified() -> Self {
        Self::new("general", 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Label implied by a score when the model gives none we recognize
    pub fn from_score(score: f64) -> Self {
        if score < -0.1 {
            SentimentLabel::Negative
        } else if score > 0.1 {
            SentimentLabel::Positive
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(SentimentLabel::Positive),
            "negative" => Ok(SentimentLabel::Negative),
            "neutral" => Ok(SentimentLabel::Neutral),
            other => Err(format!("Unknown sentiment label: {}", other)),
        }
    }
}

/// Emotional tone of a caller's utterance
///
/// `label` and `score` come from independent model outputs and may disagree
/// mildly; nothing here reconciles them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentResult {
    pub score: f64,
    pub label: SentimentLabel,
    pub confidence: f64,
}

impl SentimentResult {
    pub fn new(score: f64, label: SentimentLabel, confidence: f64) -> Self {
        Self {
            score: clamp_unit(score, -1.0, 1.0),
            label,
            confidence: clamp_unit(confidence, 0.0, 1.0),
        }
    }

    pub fn neutral() -> Self {
        Self::new(0.0, SentimentLabel::Neutral, 0.0)
    }
}

/// One stored interaction as seen by the history aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PastInteraction {
    pub created_at: DateTime<Utc>,
    pub intent: Option<String>,
    pub sentiment_score: Option<f64>,
}

/// Read-only snapshot of a caller's past interactions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerHistory {
    pub total_interactions: u64,
    pub last_interaction: Option<DateTime<Utc>>,
    pub average_sentiment: f64,
    pub previous_issues: Vec<String>,
}

/// Raw roster row as kept by the agent store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
    pub role: String,
    pub active_calls: u32,
    pub specialization: Option<String>,
}

/// Current availability of one agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentAvailability {
    pub id: String,
    pub name: String,
    pub available: bool,
    pub specialization: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Department a call can be routed to; this set is closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    Finance,
    Support,
    Sales,
    General,
}

impl Department {
    pub const ALL: [Department; 4] = [
        Department::Finance,
        Department::Support,
        Department::Sales,
        Department::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Finance => "finance",
            Department::Support => "support",
            Department::Sales => "sales",
            Department::General => "general",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Department {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Department::ALL
            .into_iter()
            .find(|d| d.as_str() == wanted)
            .ok_or_else(|| format!("Unknown department: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    Specialist,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingDecision {
    pub priority: Priority,
    pub department: Department,
    pub agent_type: AgentType,
    /// Minutes
    pub estimated_wait_time: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSuggestion {
    pub action: String,
    pub context: String,
    pub confidence: f64,
}

/// Caller request handed to the engine by the call-handling layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub caller_id: String,
    pub transcript: String,
}

impl RouteRequest {
    pub fn new(caller_id: impl Into<String>, transcript: impl Into<String>) -> Self {
        Self {
            caller_id: caller_id.into(),
            transcript: transcript.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InteractionKind {
    Call,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Inbound,
}

/// Analysis and decision behind a routed call turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageMetadata {
    pub intent: IntentResult,
    pub sentiment: SentimentResult,
    pub routing: RoutingDecision,
    pub suggestions: Vec<AgentSuggestion>,
}

/// Recording left by a caller who chose to leave a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoicemailMetadata {
    pub call_sid: String,
    pub recording_url: String,
    /// Seconds
    pub recording_duration: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "messageType", rename_all = "camelCase")]
pub enum InteractionMetadata {
    Triage(TriageMetadata),
    Voicemail(VoicemailMetadata),
}

impl InteractionMetadata {
    pub fn triage(&self) -> Option<&TriageMetadata> {
        match self {
            InteractionMetadata::Triage(triage) => Some(triage),
            InteractionMetadata::Voicemail(_) => None,
        }
    }
}

/// Content stored for every voicemail record
pub const VOICEMAIL_CONTENT: &str = "Voice message";

/// Durable log entry for one processed call turn; never mutated once written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRecord {
    pub id: Uuid,
    pub caller_id: String,
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    pub direction: Direction,
    pub content: String,
    pub metadata: InteractionMetadata,
    pub created_at: DateTime<Utc>,
}

impl InteractionRecord {
    fn inbound(caller_id: String, content: String, metadata: InteractionMetadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            caller_id,
            kind: InteractionKind::Call,
            direction: Direction::Inbound,
            content,
            metadata,
            created_at: Utc::now(),
        }
    }

    pub fn inbound_call(
        caller_id: impl Into<String>,
        transcript: impl Into<String>,
        metadata: TriageMetadata,
    ) -> Self {
        Self::inbound(
            caller_id.into(),
            transcript.into(),
            InteractionMetadata::Triage(metadata),
        )
    }

    pub fn voicemail(caller_id: impl Into<String>, metadata: VoicemailMetadata) -> Self {
        Self::inbound(
            caller_id.into(),
            VOICEMAIL_CONTENT.to_string(),
            InteractionMetadata::Voicemail(metadata),
        )
    }

    /// Voicemails count as contacts but carry no intent or sentiment
    pub fn as_past_interaction(&self) -> PastInteraction {
        let triage = self.metadata.triage();
        PastInteraction {
            created_at: self.created_at,
            intent: triage.map(|t| t.intent.intent.clone()),
            sentiment_score: triage.map(|t| t.sentiment.score),
        }
    }
}

/// Non-fatal condition attached to an otherwise successful outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Degradation {
    SuggestionsUnavailable { reason: String },
    PersistenceFailed { reason: String },
}

/// Everything a routing invocation hands back to the invoker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageOutcome {
    pub interaction_id: Uuid,
    pub routing_decision: RoutingDecision,
    pub suggestions: Vec<AgentSuggestion>,
    pub intent: IntentResult,
    pub sentiment: SentimentResult,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degradations: Vec<Degradation>,
}

impl TriageOutcome {
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn department_parses_case_insensitively() {
        assert_eq!("Finance".parse::<Department>(), Ok(Department::Finance));
        assert!("legal".parse::<Department>().is_err());
    }

    #[test]
    fn sentiment_is_clamped_on_construction() {
        let s = SentimentResult::new(-3.0, SentimentLabel::Negative, 1.7);
        assert_eq!(s.score, -1.0);
        assert_eq!(s.confidence, 1.0);

        let s = SentimentResult::new(f64::NAN, SentimentLabel::Neutral, f64::NAN);
        assert_eq!(s.score, 0.0);
        assert_eq!(s.confidence, 0.0);
    }

    #[test]
    fn routing_decision_serializes_camel_case() {
        let decision = RoutingDecision {
            priority: Priority::High,
            department: Department::Support,
            agent_type: AgentType::Specialist,
            estimated_wait_time: 5,
        };
        let json = serde_json::to_value(decision).unwrap();
        assert_eq!(json["priority"], "high");
        assert_eq!(json["department"], "support");
        assert_eq!(json["agentType"], "specialist");
        assert_eq!(json["estimatedWaitTime"], 5);
    }

    #[test]
    fn interaction_record_uses_type_field() {
        let record = InteractionRecord::inbound_call(
            "+15550100",
            "hello",
            TriageMetadata {
                intent: IntentResult::new("general", 0.9),
                sentiment: SentimentResult::neutral(),
                routing: RoutingDecision {
                    priority: Priority::Low,
                    department: Department::General,
                    agent_type: AgentType::General,
                    estimated_wait_time: 15,
                },
                suggestions: vec![],
            },
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "CALL");
        assert_eq!(json["direction"], "INBOUND");
        assert_eq!(json["callerId"], "+15550100");
        assert_eq!(json["metadata"]["messageType"], "triage");
        assert_eq!(json["metadata"]["routing"]["department"], "general");
    }

    #[test]
    fn voicemail_counts_without_intent_or_sentiment() {
        let record = InteractionRecord::voicemail(
            "+15550100",
            VoicemailMetadata {
                call_sid: "CA9".to_string(),
                recording_url: "https://recordings.example/RE1".to_string(),
                recording_duration: Some(42),
            },
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["content"], "Voice message");
        assert_eq!(json["metadata"]["messageType"], "voicemail");
        assert_eq!(json["metadata"]["recordingUrl"], "https://recordings.example/RE1");

        let past = record.as_past_interaction();
        assert!(past.intent.is_none());
        assert!(past.sentiment_score.is_none());
        assert!(record.metadata.triage().is_none());
    }
}
