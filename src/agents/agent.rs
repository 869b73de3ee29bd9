//! The agent invocation contract and its runtime-backed implementation

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::registry::{ConversationRegistry, RunKey};
use super::runtime::{AgentProfile, AgentRuntime};
use crate::domain::{APP_NAME, NO_OUTPUT_REPLY};

/// Ordered textual outputs of one agent invocation. Guaranteed non-empty:
/// an empty model result is replaced by the no-output sentinel, and a
/// runtime failure by a failure message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTurn {
    outputs: Vec<String>,
}

impl AgentTurn {
    pub fn new(outputs: Vec<String>) -> Self {
        debug_assert!(!outputs.is_empty());
        Self { outputs }
    }

    /// The turn's canonical reply: the last output.
    pub fn reply(&self) -> &str {
        self.outputs.last().map(String::as_str).unwrap_or_default()
    }

    /// Every output the turn produced, in order.
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }
}

/// One agent role seen from the orchestrator. Invocation never fails:
/// internal errors are converted into a normal, user-visible reply, so the
/// pipeline always has at least one textual output per step.
#[async_trait]
pub trait ChatAgent: Send + Sync {
    fn name(&self) -> &str;

    async fn invoke(&self, message: &str, user_id: &str, session_id: &str) -> AgentTurn;
}

/// [`ChatAgent`] backed by an [`AgentRuntime`]. Marks the conversation
/// registry before executing, so the first turn of any role establishes the
/// session regardless of how the turn ends.
pub struct RuntimeAgent {
    profile: AgentProfile,
    runtime: Arc<dyn AgentRuntime>,
    registry: Arc<ConversationRegistry>,
}

impl RuntimeAgent {
    pub fn new(
        profile: AgentProfile,
        runtime: Arc<dyn AgentRuntime>,
        registry: Arc<ConversationRegistry>,
    ) -> Self {
        Self {
            profile,
            runtime,
            registry,
        }
    }
}

#[async_trait]
impl ChatAgent for RuntimeAgent {
    fn name(&self) -> &str {
        &self.profile.name
    }

    async fn invoke(&self, message: &str, user_id: &str, session_id: &str) -> AgentTurn {
        let key = RunKey::new(APP_NAME, user_id, session_id);
        if !self.registry.exists(&key).await {
            self.registry.mark(key).await;
        }

        match self
            .runtime
            .run_turn(&self.profile, message, user_id, session_id)
            .await
        {
            Ok(outputs) if outputs.is_empty() => {
                AgentTurn::new(vec![NO_OUTPUT_REPLY.to_string()])
            }
            Ok(outputs) => AgentTurn::new(outputs),
            Err(e) => {
                warn!(agent = %self.profile.name, error = %e, "agent turn failed");
                AgentTurn::new(vec![format!("エラーが発生しました: {e}")])
            }
        }
    }
}
