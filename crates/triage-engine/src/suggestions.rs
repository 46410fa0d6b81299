//! Agent suggestion generation
//!
//! Suggestions are advisory. The engine treats any failure here, whether
//! transport, timeout or an unparseable answer, as non-fatal and routes
//! the call with an empty suggestion list.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::openai::{strip_code_fence, OpenAiClient};
use crate::types::{clamp_unit, AgentSuggestion, CustomerHistory, IntentResult, SentimentResult};

/// Everything a generator may look at
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionContext {
    pub intent: IntentResult,
    pub sentiment: SentimentResult,
    pub history: CustomerHistory,
}

#[async_trait]
pub trait SuggestionGenerator: Send + Sync {
    /// Three suggestions is the target, but any length is valid
    async fn generate(&self, context: &SuggestionContext) -> Result<Vec<AgentSuggestion>>;
}

/// Parse a model's suggestion answer
///
/// Accepts a bare array or an object wrapping the array under `suggestions`.
/// Entries without an action are dropped.
pub fn parse_suggestions(text: &str) -> Result<Vec<AgentSuggestion>> {
    #[derive(Deserialize)]
    struct Raw {
        action: Option<String>,
        #[serde(default)]
        context: String,
        #[serde(default)]
        confidence: f64,
    }

    let value: serde_json::Value = serde_json::from_str(strip_code_fence(text))
        .context("suggestion response is not JSON")?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove("suggestions") {
            Some(serde_json::Value::Array(items)) => items,
            _ => bail!("suggestion response has no suggestions array"),
        },
        _ => bail!("suggestion response is neither an array nor an object"),
    };

    let suggestions = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<Raw>(item).ok())
        .filter_map(|raw| {
            let action = raw.action?.trim().to_string();
            (!action.is_empty()).then(|| AgentSuggestion {
                action,
                context: raw.context,
                confidence: clamp_unit(raw.confidence, 0.0, 1.0),
            })
        })
        .collect();

    Ok(suggestions)
}

fn suggestion_prompt(context: &SuggestionContext) -> Result<String> {
    let history = serde_json::to_string(&context.history)?;
    Ok(format!(
        "Based on the following information, generate 3 suggestions for the agent:
1. Customer intent: {}
2. Sentiment: {} ({})
3. Customer history: {}

Respond with a JSON object with a single key \"suggestions\" holding an array. Each suggestion has:
- action: what the agent should do
- context: why this action is suggested
- confidence: how confident we are in this suggestion (0-1)",
        context.intent.intent, context.sentiment.label, context.sentiment.score, history
    ))
}

/// Suggestion generator backed by a chat-completions model
#[derive(Debug, Clone)]
pub struct OpenAiSuggestionGenerator {
    client: Arc<OpenAiClient>,
    temperature: f32,
}

impl OpenAiSuggestionGenerator {
    pub fn new(client: Arc<OpenAiClient>, temperature: f32) -> Self {
        Self { client, temperature }
    }
}

#[async_trait]
impl SuggestionGenerator for OpenAiSuggestionGenerator {
    async fn generate(&self, context: &SuggestionContext) -> Result<Vec<AgentSuggestion>> {
        let prompt = suggestion_prompt(context)?;
        let content = self
            .client
            .complete(&prompt, None, self.temperature, true)
            .await?;
        parse_suggestions(&content)
    }
}

/// Fixed per-intent suggestions for offline use
#[derive(Debug, Clone, Default)]
pub struct PlaybookSuggestionGenerator;

impl PlaybookSuggestionGenerator {
    pub fn suggestions_for(&self, context: &SuggestionContext) -> Vec<AgentSuggestion> {
        let mut out = Vec::new();
        let first = match context.intent.intent.to_lowercase().as_str() {
            "billing" => ("Review the latest invoice with the caller", "Caller raised a billing question"),
            "technical" => ("Walk through basic troubleshooting", "Caller reported a technical problem"),
            "sales" => ("Present current plans and promotions", "Caller is interested in buying"),
            "complaint" => ("Acknowledge the complaint and offer escalation", "Caller is making a complaint"),
            _ => ("Ask an open question to clarify the need", "Intent is not specific"),
        };
        out.push(AgentSuggestion {
            action: first.0.to_string(),
            context: first.1.to_string(),
            confidence: context.intent.confidence,
        });

        if context.sentiment.score < 0.0 {
            out.push(AgentSuggestion {
                action: "Open with an apology and empathy".to_string(),
                context: format!("Caller sentiment is {}", context.sentiment.label),
                confidence: context.sentiment.confidence,
            });
        }

        if !context.history.previous_issues.is_empty() {
            out.push(AgentSuggestion {
                action: "Check whether earlier issues were resolved".to_string(),
                context: format!(
                    "Previous issues: {}",
                    context.history.previous_issues.join(", ")
                ),
                confidence: 0.6,
            });
        }

        out
    }
}

#[async_trait]
impl SuggestionGenerator for PlaybookSuggestionGenerator {
    async fn generate(&self, context: &SuggestionContext) -> Result<Vec<AgentSuggestion>> {
        Ok(self.suggestions_for(context))
    }
}
