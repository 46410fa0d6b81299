use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use super::{parse_intent_response, parse_sentiment_response, IntentClassifier, SentimentAnalyzer};
use crate::openai::OpenAiClient;
use crate::types::{IntentResult, SentimentResult};

const INTENT_PROMPT: &str = "Analyze the following customer transcript and extract:
1. intent: the main intent, one of billing, technical, sales, complaint, general
2. confidence: a score between 0 and 1
3. entities: key entities such as product names or account numbers, as an object of name to value
Respond with a single JSON object with the keys intent, confidence and entities.";

const SENTIMENT_PROMPT: &str = "Analyze the sentiment of the following customer transcript.
Respond with a single JSON object with:
1. score: -1 to 1, where -1 is very negative and 1 is very positive
2. label: positive, negative or neutral
3. confidence: 0 to 1";

/// Intent classifier backed by a chat-completions model
#[derive(Debug, Clone)]
pub struct OpenAiIntentClassifier {
    client: Arc<OpenAiClient>,
    temperature: f32,
}

impl OpenAiIntentClassifier {
    pub fn new(client: Arc<OpenAiClient>, temperature: f32) -> Self {
        Self { client, temperature }
    }
}

#[async_trait]
impl IntentClassifier for OpenAiIntentClassifier {
    async fn classify_intent(&self, transcript: &str) -> Result<IntentResult> {
        if transcript.trim().is_empty() {
            return Ok(IntentResult::unclassified());
        }

        let content = self
            .client
            .complete(INTENT_PROMPT, Some(transcript), self.temperature, true)
            .await?;
        let result = parse_intent_response(&content)?;
        debug!("Classified intent '{}' ({:.2})", result.intent, result.confidence);
        Ok(result)
    }
}

/// Sentiment analyzer backed by a chat-completions model
#[derive(Debug, Clone)]
pub struct OpenAiSentimentAnalyzer {
    client: Arc<OpenAiClient>,
    temperature: f32,
}

impl OpenAiSentimentAnalyzer {
    pub fn new(client: Arc<OpenAiClient>, temperature: f32) -> Self {
        Self { client, temperature }
    }
}

#[async_trait]
impl SentimentAnalyzer for OpenAiSentimentAnalyzer {
    async fn analyze_sentiment(&self, transcript: &str) -> Result<SentimentResult> {
        if transcript.trim().is_empty() {
            return Ok(SentimentResult::neutral());
        }

        let content = self
            .client
            .complete(SENTIMENT_PROMPT, Some(transcript), self.temperature, true)
            .await?;
        let result = parse_sentiment_response(&content)?;
        debug!("Sentiment {} ({:.2})", result.label, result.score);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenAiConfig;

    fn unreachable_client() -> Arc<OpenAiClient> {
        let config = OpenAiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..OpenAiConfig::default()
        };
        Arc::new(OpenAiClient::new("test-key", &config))
    }

    #[tokio::test]
    async fn blank_transcript_never_calls_out() {
        let classifier = OpenAiIntentClassifier::new(unreachable_client(), 0.3);
        let intent = classifier.classify_intent("   ").await.unwrap();
        assert_eq!(intent, IntentResult::unclassified());

        let analyzer = OpenAiSentimentAnalyzer::new(unreachable_client(), 0.3);
        let sentiment = analyzer.analyze_sentiment("").await.unwrap();
        assert_eq!(sentiment, SentimentResult::neutral());
    }

    #[tokio::test]
    async fn transport_failure_is_an_error() {
        let classifier = OpenAiIntentClassifier::new(unreachable_client(), 0.3);
        assert!(classifier.classify_intent("my bill is wrong").await.is_err());
    }
}
