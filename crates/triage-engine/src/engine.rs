//! # Triage Engine
//!
//! The root of the triage pipeline. One call to [`TriageEngine::route`]
//! handles one caller utterance:
//!
//! ```text
//! ┌───────────────┐ ┌─────────────────┐ ┌────────────┐ ┌──────────────┐
//! │ Intent        │ │ Sentiment       │ │ History    │ │ Availability │
//! └───────┬───────┘ └────────┬────────┘ └─────┬──────┘ └──────┬───────┘
//!         └──────────────────┴───── try_join ─┴───────────────┘
//!                                    │  any failure or timeout: fatal
//!                          ┌─────────▼─────────┐
//!                          │  RoutingPolicy    │ deterministic
//!                          └─────────┬─────────┘
//!                          ┌─────────▼─────────┐
//!                          │  Suggestions      │ failure: empty list
//!                          └─────────┬─────────┘
//!                          ┌─────────▼─────────┐
//!                          │  Interaction log  │ failure: logged
//!                          └───────────────────┘
//! ```
//!
//! The engine holds no mutable state; concurrent invocations for different
//! calls share nothing but the collaborators.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use triage_engine::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let store = Arc::new(InMemoryStore::new());
//! let engine = TriageEngine::builder()
//!     .with_offline_analyzers()
//!     .with_store(store)
//!     .build()?;
//!
//! let outcome = engine
//!     .route(&RouteRequest::new("+15550100", "I was charged twice on my bill"))
//!     .await?;
//! println!("{:?}", outcome.routing_decision);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use tracing::{debug, error, info, warn};

use crate::agents::{AgentDirectory, AvailabilityResolver};
use crate::analysis::{
    IntentClassifier, KeywordIntentClassifier, LexiconSentimentAnalyzer, OpenAiIntentClassifier,
    OpenAiSentimentAnalyzer, SentimentAnalyzer,
};
use crate::config::{OpenAiConfig, PersistenceMode, RoutingConfig, TimeoutConfig, TriageConfig};
use crate::error::{Result, Stage, TriageError};
use crate::history::{HistoryAggregator, HistoryStore, InteractionStore};
use crate::openai::OpenAiClient;
use crate::routing::RoutingPolicy;
use crate::suggestions::{
    OpenAiSuggestionGenerator, PlaybookSuggestionGenerator, SuggestionContext, SuggestionGenerator,
};
use crate::types::{
    AgentAvailability, AgentSuggestion, CustomerHistory, Degradation, IntentResult,
    InteractionRecord, RouteRequest, RoutingDecision, SentimentResult, TriageMetadata,
    TriageOutcome, VoicemailMetadata,
};

fn collaborator_error(stage: Stage, err: anyhow::Error) -> TriageError {
    let message = format!("{:#}", err);
    match stage {
        Stage::Intent | Stage::Sentiment => TriageError::analysis(stage, message),
        Stage::History => TriageError::history(message),
        Stage::Availability => TriageError::availability(message),
        Stage::Suggestions | Stage::Persistence => {
            TriageError::internal(format!("{} failed: {}", stage, message))
        }
    }
}

/// Run a collaborator call under a deadline, tagging failures with their stage
async fn bounded<T>(
    stage: Stage,
    limit: Duration,
    call: impl Future<Output = anyhow::Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(collaborator_error(stage, e)),
        Err(_) => Err(TriageError::Timeout { stage }),
    }
}

/// Result of the cancellable part of routing, before persistence
struct Analyzed {
    intent: IntentResult,
    sentiment: SentimentResult,
    decision: RoutingDecision,
    suggestions: Vec<AgentSuggestion>,
    degradations: Vec<Degradation>,
}

/// Call triage engine
#[derive(Clone)]
pub struct TriageEngine {
    intent: Arc<dyn IntentClassifier>,
    sentiment: Arc<dyn SentimentAnalyzer>,
    history: HistoryAggregator,
    agents: AvailabilityResolver,
    suggestions: Arc<dyn SuggestionGenerator>,
    interactions: Arc<dyn InteractionStore>,
    policy: RoutingPolicy,
    timeouts: TimeoutConfig,
}

impl TriageEngine {
    pub fn builder() -> TriageEngineBuilder {
        TriageEngineBuilder::new()
    }

    pub fn policy(&self) -> &RoutingPolicy {
        &self.policy
    }

    /// Customer history as the engine would see it for this caller
    pub async fn fetch_history(&self, caller_id: &str) -> Result<CustomerHistory> {
        bounded(
            Stage::History,
            self.timeouts.history(),
            self.history.fetch_history(caller_id),
        )
        .await
    }

    /// Agent availability as the engine would see it right now
    pub async fn list_agents(&self) -> Result<Vec<AgentAvailability>> {
        bounded(
            Stage::Availability,
            self.timeouts.availability(),
            self.agents.list_agents(),
        )
        .await
    }

    /// Route one caller utterance
    pub async fn route(&self, request: &RouteRequest) -> Result<TriageOutcome> {
        self.route_with_cancellation(request, &CancellationToken::new())
            .await
    }

    /// Route one caller utterance, giving up if `cancel` fires first
    ///
    /// Cancellation drops outstanding collaborator calls. A cancelled route
    /// never writes an interaction record.
    pub async fn route_with_cancellation(
        &self,
        request: &RouteRequest,
        cancel: &CancellationToken,
    ) -> Result<TriageOutcome> {
        if request.caller_id.trim().is_empty() {
            return Err(TriageError::invalid_input("caller id is empty"));
        }
        if request.transcript.trim().is_empty() {
            return Err(TriageError::invalid_input("transcript is empty"));
        }

        let analyzed = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Routing for {} cancelled before a decision was made", request.caller_id);
                return Err(TriageError::Cancelled);
            }
            analyzed = self.analyze(request) => analyzed,
        };

        let mut analyzed = match analyzed {
            Ok(analyzed) => analyzed,
            Err(e) => {
                error!("❌ Routing for {} failed: {}", request.caller_id, e);
                return Err(e);
            }
        };

        if cancel.is_cancelled() {
            warn!("Routing for {} cancelled; interaction not recorded", request.caller_id);
            return Err(TriageError::Cancelled);
        }

        let record = InteractionRecord::inbound_call(
            request.caller_id.clone(),
            request.transcript.clone(),
            TriageMetadata {
                intent: analyzed.intent.clone(),
                sentiment: analyzed.sentiment.clone(),
                routing: analyzed.decision,
                suggestions: analyzed.suggestions.clone(),
            },
        );
        let interaction_id = record.id;

        if let Some(degradation) = self.persist(record).await {
            analyzed.degradations.push(degradation);
        }

        info!(
            "📞 Routed {} to {} ({} priority, {:?} agent, ~{} min)",
            request.caller_id,
            analyzed.decision.department,
            analyzed.decision.priority,
            analyzed.decision.agent_type,
            analyzed.decision.estimated_wait_time
        );

        Ok(TriageOutcome {
            interaction_id,
            routing_decision: analyzed.decision,
            suggestions: analyzed.suggestions,
            intent: analyzed.intent,
            sentiment: analyzed.sentiment,
            degradations: analyzed.degradations,
        })
    }

    /// Append a caller's voicemail to the interaction log
    ///
    /// Unlike a routed call there is no decision to fall back on, so a failed
    /// or timed out write is returned as an error.
    pub async fn record_voicemail(
        &self,
        caller_id: &str,
        voicemail: VoicemailMetadata,
    ) -> Result<Uuid> {
        if caller_id.trim().is_empty() {
            return Err(TriageError::invalid_input("caller id is empty"));
        }
        if voicemail.recording_url.trim().is_empty() {
            return Err(TriageError::invalid_input("recording url is empty"));
        }

        let record = InteractionRecord::voicemail(caller_id, voicemail);
        bounded(
            Stage::Persistence,
            self.timeouts.persistence(),
            self.interactions.append(&record),
        )
        .await?;

        info!("📼 Voicemail {} recorded for {}", record.id, caller_id);
        Ok(record.id)
    }

    async fn analyze(&self, request: &RouteRequest) -> Result<Analyzed> {
        let transcript = request.transcript.as_str();
        let caller_id = request.caller_id.as_str();

        let (intent, sentiment, history, agents) = tokio::try_join!(
            bounded(
                Stage::Intent,
                self.timeouts.intent(),
                self.intent.classify_intent(transcript)
            ),
            bounded(
                Stage::Sentiment,
                self.timeouts.sentiment(),
                self.sentiment.analyze_sentiment(transcript)
            ),
            bounded(
                Stage::History,
                self.timeouts.history(),
                self.history.fetch_history(caller_id)
            ),
            bounded(
                Stage::Availability,
                self.timeouts.availability(),
                self.agents.list_agents()
            ),
        )?;

        debug!(
            "Gathered for {}: intent={} ({:.2}), sentiment={:.2}, history={}, agents={}",
            caller_id,
            intent.intent,
            intent.confidence,
            sentiment.score,
            history.total_interactions,
            agents.len()
        );

        let decision = self.policy.decide(&intent, &sentiment, &history, &agents);

        let context = SuggestionContext {
            intent,
            sentiment,
            history,
        };
        let mut degradations = Vec::new();
        let suggestions = match tokio::time::timeout(
            self.timeouts.suggestions(),
            self.suggestions.generate(&context),
        )
        .await
        {
            Ok(Ok(suggestions)) => suggestions,
            Ok(Err(e)) => {
                let reason = format!("{:#}", e);
                warn!("⚠️ Suggestions unavailable for {}: {}", caller_id, reason);
                degradations.push(Degradation::SuggestionsUnavailable { reason });
                Vec::new()
            }
            Err(_) => {
                let reason = format!("timed out after {}ms", self.timeouts.suggestions_ms);
                warn!("⚠️ Suggestions unavailable for {}: {}", caller_id, reason);
                degradations.push(Degradation::SuggestionsUnavailable { reason });
                Vec::new()
            }
        };

        Ok(Analyzed {
            intent: context.intent,
            sentiment: context.sentiment,
            decision,
            suggestions,
            degradations,
        })
    }

    /// Write the record according to the persistence mode
    ///
    /// Returns a degradation only in awaited mode; detached writes report
    /// through the log alone.
    async fn persist(&self, record: InteractionRecord) -> Option<Degradation> {
        let limit = self.timeouts.persistence();
        match self.timeouts.persistence_mode {
            PersistenceMode::Awaited => {
                write_record(self.interactions.as_ref(), &record, limit)
                    .await
                    .err()
                    .map(|reason| Degradation::PersistenceFailed { reason })
            }
            PersistenceMode::Detached => {
                let store = Arc::clone(&self.interactions);
                tokio::spawn(async move {
                    let _ = write_record(store.as_ref(), &record, limit).await;
                });
                None
            }
        }
    }
}

async fn write_record(
    store: &dyn InteractionStore,
    record: &InteractionRecord,
    limit: Duration,
) -> std::result::Result<(), String> {
    let reason = match tokio::time::timeout(limit, store.append(record)).await {
        Ok(Ok(())) => {
            debug!("Interaction {} recorded for {}", record.id, record.caller_id);
            return Ok(());
        }
        Ok(Err(e)) => format!("{:#}", e),
        Err(_) => format!("timed out after {}ms", limit.as_millis()),
    };
    error!(
        "💾 Interaction {} for {} not recorded, it will be missing from future history: {}",
        record.id, record.caller_id, reason
    );
    Err(reason)
}

/// Builder for [`TriageEngine`]
#[derive(Default)]
pub struct TriageEngineBuilder {
    intent: Option<Arc<dyn IntentClassifier>>,
    sentiment: Option<Arc<dyn SentimentAnalyzer>>,
    history: Option<Arc<dyn HistoryStore>>,
    agents: Option<Arc<dyn AgentDirectory>>,
    suggestions: Option<Arc<dyn SuggestionGenerator>>,
    interactions: Option<Arc<dyn InteractionStore>>,
    routing: RoutingConfig,
    timeouts: TimeoutConfig,
}

impl TriageEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take routing rules and timeouts from a loaded configuration
    pub fn with_config(mut self, config: &TriageConfig) -> Self {
        self.routing = config.routing.clone();
        self.timeouts = config.timeouts.clone();
        self
    }

    pub fn with_routing(mut self, routing: RoutingConfig) -> Self {
        self.routing = routing;
        self
    }

    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_intent_classifier(mut self, classifier: Arc<dyn IntentClassifier>) -> Self {
        self.intent = Some(classifier);
        self
    }

    pub fn with_sentiment_analyzer(mut self, analyzer: Arc<dyn SentimentAnalyzer>) -> Self {
        self.sentiment = Some(analyzer);
        self
    }

    pub fn with_history_store(mut self, store: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(store);
        self
    }

    pub fn with_agent_directory(mut self, directory: Arc<dyn AgentDirectory>) -> Self {
        self.agents = Some(directory);
        self
    }

    pub fn with_suggestion_generator(mut self, generator: Arc<dyn SuggestionGenerator>) -> Self {
        self.suggestions = Some(generator);
        self
    }

    pub fn with_interaction_store(mut self, store: Arc<dyn InteractionStore>) -> Self {
        self.interactions = Some(store);
        self
    }

    /// Use one store for the interaction log and the agent roster
    pub fn with_store<S>(self, store: Arc<S>) -> Self
    where
        S: InteractionStore + HistoryStore + AgentDirectory + 'static,
    {
        self.with_history_store(store.clone())
            .with_agent_directory(store.clone())
            .with_interaction_store(store)
    }

    /// Model-backed intent, sentiment and suggestions sharing one client
    pub fn with_openai(self, client: Arc<OpenAiClient>, config: &OpenAiConfig) -> Self {
        self.with_intent_classifier(Arc::new(OpenAiIntentClassifier::new(
            client.clone(),
            config.analysis_temperature,
        )))
        .with_sentiment_analyzer(Arc::new(OpenAiSentimentAnalyzer::new(
            client.clone(),
            config.analysis_temperature,
        )))
        .with_suggestion_generator(Arc::new(OpenAiSuggestionGenerator::new(
            client,
            config.suggestion_temperature,
        )))
    }

    /// Keyword intent, word-list sentiment and playbook suggestions
    pub fn with_offline_analyzers(self) -> Self {
        self.with_intent_classifier(Arc::new(KeywordIntentClassifier::default()))
            .with_sentiment_analyzer(Arc::new(LexiconSentimentAnalyzer::default()))
            .with_suggestion_generator(Arc::new(PlaybookSuggestionGenerator))
    }

    pub fn build(self) -> Result<TriageEngine> {
        fn required<T>(value: Option<T>, name: &str) -> Result<T> {
            value.ok_or_else(|| TriageError::config(format!("triage engine needs a {}", name)))
        }

        Ok(TriageEngine {
            intent: required(self.intent, "intent classifier")?,
            sentiment: required(self.sentiment, "sentiment analyzer")?,
            history: HistoryAggregator::new(required(self.history, "history store")?),
            agents: AvailabilityResolver::new(required(self.agents, "agent directory")?),
            suggestions: required(self.suggestions, "suggestion generator")?,
            interactions: required(self.interactions, "interaction store")?,
            policy: RoutingPolicy::new(self.routing),
            timeouts: self.timeouts,
        })
    }
}
