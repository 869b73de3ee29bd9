//! Agent runtime: the collaborator that executes one reasoning turn
//!
//! The pipeline only depends on the [`AgentRuntime`] trait; [`GeminiRuntime`]
//! is the production implementation against the Gemini REST API, with a
//! bounded function-calling loop and in-memory per-session transcripts.

use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::error::{AgentError, AgentResult, LlmError};
use super::tools::AgentTool;
use crate::config::LlmSettings;

/// Static description of one agent role: its identity, system instruction,
/// and the tools the model may call.
pub struct AgentProfile {
    pub name: String,
    pub instruction: String,
    pub tools: Vec<Arc<dyn AgentTool>>,
}

/// Executes one reasoning turn for a role. Resuming a (user, session) pair
/// implies access to that pair's prior turns; transcript bookkeeping belongs
/// to the runtime, not to the conversation registry.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Runs the turn and returns every textual output the model produced,
    /// in order. May invoke any number of the profile's tools.
    async fn run_turn(
        &self,
        profile: &AgentProfile,
        message: &str,
        user_id: &str,
        session_id: &str,
    ) -> AgentResult<Vec<String>>;
}

pub(crate) struct FunctionCall {
    pub name: String,
    pub args: Value,
}

/// First candidate's content, if the response has one.
pub(crate) fn candidate_content(response: &Value) -> Option<&Value> {
    response
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
}

/// Splits a model content into its joined text and its function calls.
pub(crate) fn split_parts(content: &Value) -> (Option<String>, Vec<FunctionCall>) {
    let mut texts: Vec<&str> = Vec::new();
    let mut calls = Vec::new();

    if let Some(parts) = content.get("parts").and_then(|p| p.as_array()) {
        for part in parts {
            if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
                if !text.is_empty() {
                    texts.push(text);
                }
            }
            if let Some(fc) = part.get("functionCall") {
                calls.push(FunctionCall {
                    name: fc
                        .get("name")
                        .and_then(|n| n.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    args: fc.get("args").cloned().unwrap_or_else(|| json!({})),
                });
            }
        }
    }

    let text = if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n"))
    };
    (text, calls)
}

type TranscriptKey = (String, String);

/// Gemini-backed runtime. One instance serves every role; transcripts are
/// keyed by (user, session) and shared across roles, so each agent in a
/// pipeline sees the turns the previous agents appended.
pub struct GeminiRuntime {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tool_iterations: u32,
    transcripts: RwLock<HashMap<TranscriptKey, Vec<Value>>>,
}

impl GeminiRuntime {
    pub fn new(settings: &LlmSettings) -> Result<Self, LlmError> {
        let api_key = env::var(&settings.api_key_env).map_err(|_| {
            LlmError::Authentication(format!(
                "Environment variable {} not set",
                settings.api_key_env
            ))
        })?;

        let base_url = settings
            .base_url
            .clone()
            .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".to_string());

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            model: settings.model.clone(),
            max_tool_iterations: settings.max_tool_iterations,
            transcripts: RwLock::new(HashMap::new()),
        })
    }

    fn build_request_body(&self, profile: &AgentProfile, contents: &[Value]) -> Value {
        let mut body = json!({
            "system_instruction": { "parts": [{ "text": profile.instruction }] },
            "contents": contents,
        });

        if !profile.tools.is_empty() {
            body["tools"] = json!([{
                "function_declarations": profile.tools.iter().map(|t| {
                    json!({
                        "name": t.name(),
                        "description": t.description(),
                        "parameters": t.parameters(),
                    })
                }).collect::<Vec<_>>()
            }]);
        }

        body
    }

    async fn generate(&self, body: &Value) -> Result<Value, LlmError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))
    }
}

#[async_trait]
impl AgentRuntime for GeminiRuntime {
    async fn run_turn(
        &self,
        profile: &AgentProfile,
        message: &str,
        user_id: &str,
        session_id: &str,
    ) -> AgentResult<Vec<String>> {
        let key: TranscriptKey = (user_id.to_string(), session_id.to_string());
        let mut contents = {
            let transcripts = self.transcripts.read().await;
            transcripts.get(&key).cloned().unwrap_or_default()
        };
        contents.push(json!({ "role": "user", "parts": [{ "text": message }] }));

        let mut outputs = Vec::new();
        let mut iterations = 0u32;

        loop {
            let body = self.build_request_body(profile, &contents);
            let response = self.generate(&body).await?;

            let Some(content) = candidate_content(&response).cloned() else {
                return Err(AgentError::Execution(
                    "model returned no candidates".to_string(),
                ));
            };

            let (text, calls) = split_parts(&content);
            if let Some(text) = text {
                outputs.push(text);
            }
            contents.push(content);

            if calls.is_empty() {
                break;
            }

            iterations += 1;
            if iterations > self.max_tool_iterations {
                return Err(AgentError::MaxIterations(self.max_tool_iterations));
            }

            let mut response_parts = Vec::new();
            for call in calls {
                debug!(agent = %profile.name, tool = %call.name, "dispatching tool call");
                let result = match profile.tools.iter().find(|t| t.name() == call.name) {
                    Some(tool) => tool.call(call.args, user_id).await,
                    None => {
                        warn!(agent = %profile.name, tool = %call.name, "unknown tool requested");
                        json!({ "status": "error", "message": "unknown tool" })
                    }
                };
                response_parts.push(json!({
                    "functionResponse": { "name": call.name, "response": result }
                }));
            }
            contents.push(json!({ "role": "user", "parts": response_parts }));
        }

        self.transcripts.write().await.insert(key, contents);
        Ok(outputs)
    }
}
