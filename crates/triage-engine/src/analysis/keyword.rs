//! Offline analyzers
//!
//! Used when no model provider is configured (`--offline`) and as a cheap
//! baseline. Both work on lowercase word tokens.

use anyhow::Result;
use async_trait::async_trait;

use super::{IntentClassifier, SentimentAnalyzer};
use crate::types::{IntentResult, SentimentLabel, SentimentResult};

fn tokens(transcript: &str) -> Vec<String> {
    transcript
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Keyword-table intent classifier
#[derive(Debug, Clone)]
pub struct KeywordIntentClassifier {
    table: Vec<(String, Vec<String>)>,
}

impl Default for KeywordIntentClassifier {
    fn default() -> Self {
        let table: &[(&str, &[&str])] = &[
            (
                "billing",
                &["bill", "billing", "invoice", "charge", "charged", "payment", "refund", "balance", "price"],
            ),
            (
                "technical",
                &["error", "broken", "crash", "internet", "password", "login", "outage", "install", "working"],
            ),
            (
                "sales",
                &["buy", "purchase", "upgrade", "plan", "offer", "pricing", "quote", "demo", "interested"],
            ),
            (
                "complaint",
                &["cancel", "complaint", "furious", "unacceptable", "terrible", "worst", "angry", "manager"],
            ),
        ];
        Self::new(
            table
                .iter()
                .map(|(intent, words)| (intent.to_string(), words.iter().map(|w| w.to_string()).collect()))
                .collect(),
        )
    }
}

impl KeywordIntentClassifier {
    pub fn new(table: Vec<(String, Vec<String>)>) -> Self {
        Self { table }
    }

    pub fn classify(&self, transcript: &str) -> IntentResult {
        let words = tokens(transcript);
        if words.is_empty() {
            return IntentResult::unclassified();
        }

        let hits: Vec<(&str, usize)> = self
            .table
            .iter()
            .map(|(intent, keywords)| {
                let n = words.iter().filter(|w| keywords.contains(w)).count();
                (intent.as_str(), n)
            })
            .collect();
        let total: usize = hits.iter().map(|(_, n)| n).sum();

        // First table entry wins ties
        let best = hits
            .iter()
            .fold(None::<(&str, usize)>, |best, &(intent, n)| match best {
                Some((_, b)) if b >= n => best,
                _ if n > 0 => Some((intent, n)),
                _ => best,
            });

        match best {
            Some((intent, n)) => IntentResult::new(intent, n as f64 / total as f64),
            None => IntentResult::new("general", 0.2),
        }
    }
}

#[async_trait]
impl IntentClassifier for KeywordIntentClassifier {
    async fn classify_intent(&self, transcript: &str) -> Result<IntentResult> {
        Ok(self.classify(transcript))
    }
}

/// Weighted word-list sentiment analyzer
#[derive(Debug, Clone)]
pub struct LexiconSentimentAnalyzer {
    lexicon: Vec<(String, f64)>,
}

impl Default for LexiconSentimentAnalyzer {
    fn default() -> Self {
        let lexicon: &[(&str, f64)] = &[
            ("thanks", 0.5),
            ("thank", 0.5),
            ("great", 1.0),
            ("love", 1.0),
            ("happy", 1.0),
            ("excellent", 1.0),
            ("good", 0.5),
            ("please", 0.2),
            ("interested", 0.5),
            ("problem", -0.5),
            ("issue", -0.4),
            ("wrong", -0.6),
            ("cancel", -0.5),
            ("broken", -0.8),
            ("bad", -0.8),
            ("angry", -1.5),
            ("upset", -1.2),
            ("terrible", -1.5),
            ("worst", -1.5),
            ("unacceptable", -1.5),
            ("furious", -2.0),
            ("hate", -1.5),
        ];
        Self::new(lexicon.iter().map(|(w, s)| (w.to_string(), *s)).collect())
    }
}

impl LexiconSentimentAnalyzer {
    pub fn new(lexicon: Vec<(String, f64)>) -> Self {
        Self { lexicon }
    }

    pub fn score(&self, transcript: &str) -> SentimentResult {
        let words = tokens(transcript);
        let mut sum = 0.0;
        let mut matched = 0usize;
        for word in &words {
            if let Some((_, weight)) = self.lexicon.iter().find(|(w, _)| w == word) {
                sum += weight;
                matched += 1;
            }
        }

        if matched == 0 {
            return SentimentResult::new(0.0, SentimentLabel::Neutral, if words.is_empty() { 0.0 } else { 0.4 });
        }

        let score = (sum / 2.0).clamp(-1.0, 1.0);
        let confidence = (0.4 + 0.2 * matched as f64).min(0.9);
        SentimentResult::new(score, SentimentLabel::from_score(score), confidence)
    }
}

#[async_trait]
impl SentimentAnalyzer for LexiconSentimentAnalyzer {
    async fn analyze_sentiment(&self, transcript: &str) -> Result<SentimentResult> {
        Ok(self.score(transcript))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billing_keywords_win() {
        let classifier = KeywordIntentClassifier::default();
        let result = classifier.classify("I was charged twice on my last bill");
        assert_eq!(result.intent, "billing");
        assert!(result.confidence > 0.0 && result.confidence <= 1.0);
    }

    #[test]
    fn no_keywords_is_general() {
        let classifier = KeywordIntentClassifier::default();
        let result = classifier.classify("What are your business hours?");
        assert_eq!(result.intent, "general");
        assert_eq!(classifier.classify("  "), IntentResult::unclassified());
    }

    #[test]
    fn furious_caller_scores_strongly_negative() {
        let analyzer = LexiconSentimentAnalyzer::default();
        let result = analyzer.score("I want to cancel my subscription, I'm furious");
        assert!(result.score < -0.5);
        assert_eq!(result.label, SentimentLabel::Negative);
        assert!((0.0..=1.0).contains(&result.confidence));
    }

    #[test]
    fn neutral_question_scores_zero() {
        let analyzer = LexiconSentimentAnalyzer::default();
        let result = analyzer.score("What are your business hours?");
        assert_eq!(result.score, 0.0);
        assert_eq!(result.label, SentimentLabel::Neutral);
    }
}
