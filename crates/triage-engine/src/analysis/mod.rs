//! # Transcript Analysis
//!
//! Intent classification and sentiment scoring of a caller's transcript.
//! Both are leaves of the triage pipeline: pure functions of the transcript
//! (modulo model nondeterminism) with no side effects.
//!
//! Implementations never retry. A transport failure, timeout or malformed
//! model answer is returned as an error and the engine decides what it means
//! for the call.
//!
//! - [`openai`]: chat-completions backed classifier and analyzer
//! - [`keyword`]: offline keyword and word-list fallbacks

pub mod keyword;
pub mod openai;

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::openai::strip_code_fence;
use crate::types::{IntentResult, SentimentLabel, SentimentResult};

pub use keyword::{KeywordIntentClassifier, LexiconSentimentAnalyzer};
pub use openai::{OpenAiIntentClassifier, OpenAiSentimentAnalyzer};

/// Maps a transcript to a labeled intent
///
/// A blank transcript must yield [`IntentResult::unclassified`] rather than an
/// error or an outbound call.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify_intent(&self, transcript: &str) -> Result<IntentResult>;
}

/// Maps a transcript to a sentiment score, label and confidence
#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    async fn analyze_sentiment(&self, transcript: &str) -> Result<SentimentResult>;
}

fn entity_value(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Parse a model's intent answer
///
/// Missing fields degrade (`"general"`, confidence 0, no entities); a body
/// that is not a JSON object is an error.
pub fn parse_intent_response(text: &str) -> Result<IntentResult> {
    #[derive(Deserialize)]
    struct Raw {
        intent: Option<String>,
        confidence: Option<f64>,
        entities: Option<serde_json::Value>,
    }

    let raw: Raw = serde_json::from_str(strip_code_fence(text))
        .context("intent response is not a JSON object")?;

    let intent = raw
        .intent
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .unwrap_or_else(|| "general".to_string());

    let mut result = IntentResult::new(intent, raw.confidence.unwrap_or(0.0));

    // Entities arrive either as an object or as a list of {name/type, value}
    result.entities = match raw.entities {
        Some(serde_json::Value::Object(map)) => map
            .into_iter()
            .map(|(k, v)| (k, entity_value(v)))
            .collect(),
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| {
                let obj = item.as_object()?;
                let key = obj
                    .get("name")
                    .or_else(|| obj.get("type"))
                    .and_then(|k| k.as_str())?
                    .to_string();
                let value = obj.get("value").cloned().map(entity_value)?;
                Some((key, value))
            })
            .collect(),
        _ => BTreeMap::new(),
    };

    Ok(result)
}

/// Parse a model's sentiment answer
///
/// A missing score is an error: without it the priority rules have nothing
/// to work with.
pub fn parse_sentiment_response(text: &str) -> Result<SentimentResult> {
    #[derive(Deserialize)]
    struct Raw {
        score: Option<f64>,
        label: Option<String>,
        confidence: Option<f64>,
    }

    let raw: Raw = serde_json::from_str(strip_code_fence(text))
        .context("sentiment response is not a JSON object")?;

    let score = raw
        .score
        .context("sentiment response has no score")?;

    let label = raw
        .label
        .and_then(|l| l.parse::<SentimentLabel>().ok())
        .unwrap_or_else(|| SentimentLabel::from_score(score));

    Ok(SentimentResult::new(score, label, raw.confidence.unwrap_or(0.0)))
}
