//! Web search adapter backed by the Gemini grounded-search API

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::LlmSettings;
use crate::domain::SearchPort;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Answers free-text queries by asking the model with search grounding
/// enabled. Shares the LLM settings with the agent runtime but keeps its
/// own client; a search failure must not disturb an in-flight turn.
pub struct GroundedSearchClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GroundedSearchClient {
    pub fn new(settings: &LlmSettings) -> anyhow::Result<Self> {
        let api_key = env::var(&settings.api_key_env).map_err(|_| {
            anyhow::anyhow!("Environment variable {} not set", settings.api_key_env)
        })?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".to_string()),
            model: settings.model.clone(),
        })
    }
}

#[async_trait]
impl SearchPort for GroundedSearchClient {
    async fn search(&self, query: &str) -> anyhow::Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": query }] }],
            "tools": [{ "google_search": {} }],
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let data: Value = response.json().await?;
        let parts = data
            .pointer("/candidates/0/content/parts")
            .and_then(|p| p.as_array())
            .ok_or_else(|| anyhow::anyhow!("search response had no candidates"))?;

        let answer: Vec<&str> = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect();
        if answer.is_empty() {
            anyhow::bail!("search response contained no text");
        }

        Ok(answer.join("\n"))
    }
}
