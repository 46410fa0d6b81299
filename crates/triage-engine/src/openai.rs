//! Chat-completions client shared by the model-backed analyzers

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::config::OpenAiConfig;

#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, config: &OpenAiConfig) -> Self {
        Self {
            api_key: api_key.into(),
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }

    /// Create from the environment variable named in the config
    pub fn from_env(config: &OpenAiConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| anyhow!("{} environment variable not set", config.api_key_env))?;
        Ok(Self::new(api_key, config))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one completion request and return the first choice's content
    ///
    /// `user_prompt` is omitted from the message list when `None`, which is how
    /// the suggestion prompt is sent.
    pub async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: Option<&str>,
        temperature: f32,
        json_mode: bool,
    ) -> Result<String> {
        let mut messages = vec![serde_json::json!({"role": "system", "content": system_prompt})];
        if let Some(user) = user_prompt {
            messages.push(serde_json::json!({"role": "user", "content": user}));
        }

        let mut body = serde_json::json!({
            "model": &self.model,
            "messages": messages,
            "temperature": temperature,
        });
        if json_mode {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("chat completion request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("OpenAI API error {}: {}", status, body));
        }

        #[derive(Deserialize)]
        struct Message {
            content: Option<String>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: Message,
        }
        #[derive(Deserialize)]
        struct ApiResponse {
            choices: Vec<Choice>,
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .context("malformed chat completion response")?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("OpenAI returned no content"))?;

        tracing::debug!(
            "completion content: {}",
            content.chars().take(500).collect::<String>()
        );
        Ok(content)
    }
}

/// Strip a Markdown code fence some models wrap around JSON
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_fences_are_removed() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  [1, 2] "), "[1, 2]");
    }
}
