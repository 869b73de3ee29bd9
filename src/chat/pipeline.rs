//! Chat orchestration pipeline
//!
//! One inbound chat request becomes one spawned task that runs either the
//! first-turn pipeline (LOCATE → SUGGEST → PIN_SUGGESTIONS → REPORT[1..] →
//! FOLLOWUP) or, once the session is established, the single-step
//! continuation pipeline. Agent invocations within a run are strictly
//! sequential; later steps consume earlier steps' replies as input.

use std::sync::Arc;

use tracing::{info, warn};

use super::pins::PinStore;
use super::stream::{ChatStream, ChatStreamSender};
use crate::agents::agent::ChatAgent;
use crate::agents::error::AgentResult;
use crate::agents::registry::{ConversationRegistry, RunKey};
use crate::domain::{ChatEvent, APP_NAME, NO_REPORT_MARKER};

/// All agent roles a pipeline run can invoke. `reports` holds one agent per
/// report slot, in slot order.
pub struct AgentSet {
    pub locate: Arc<dyn ChatAgent>,
    pub suggest: Arc<dyn ChatAgent>,
    pub pin_suggestions: Arc<dyn ChatAgent>,
    pub reports: Vec<Arc<dyn ChatAgent>>,
    pub followup: Arc<dyn ChatAgent>,
    pub general: Arc<dyn ChatAgent>,
}

pub struct ChatPipeline {
    agents: AgentSet,
    pins: Arc<PinStore>,
    registry: Arc<ConversationRegistry>,
}

impl ChatPipeline {
    pub fn new(
        agents: AgentSet,
        pins: Arc<PinStore>,
        registry: Arc<ConversationRegistry>,
    ) -> Self {
        Self {
            agents,
            pins,
            registry,
        }
    }

    /// Starts a run and returns its event stream. The branch is selected
    /// once, here: the triple's registry state at entry decides first-turn
    /// vs continuation and is not re-evaluated mid-pipeline.
    pub fn run(
        self: &Arc<Self>,
        message: String,
        user_id: String,
        session_id: String,
    ) -> ChatStream {
        let (sender, stream) = ChatStream::channel(64);
        let pipeline = Arc::clone(self);

        tokio::spawn(async move {
            let key = RunKey::new(APP_NAME, &user_id, &session_id);
            let continuation = pipeline.registry.exists(&key).await;
            info!(session_id, continuation, "starting chat pipeline");

            let result = if continuation {
                pipeline
                    .continuation(&sender, &message, &user_id, &session_id)
                    .await
            } else {
                pipeline
                    .first_turn(&sender, &message, &user_id, &session_id)
                    .await
            };

            // Both branches share this guard: any error that escapes a
            // pipeline ends the stream with a single terminal error event.
            if let Err(e) = result {
                warn!(session_id, error = %e, "chat pipeline aborted");
                let _ = sender
                    .send(ChatEvent::error(format!("会話中にエラーが発生しました: {e}")))
                    .await;
            }
        });

        stream
    }

    async fn first_turn(
        &self,
        sender: &ChatStreamSender,
        message: &str,
        user_id: &str,
        session_id: &str,
    ) -> AgentResult<()> {
        // LOCATE: pin the workplace station named in the raw message.
        let turn = self.agents.locate.invoke(message, user_id, session_id).await;
        let pin_message = turn.reply().to_string();
        if !self.flush_pins(sender, user_id).await {
            return Ok(());
        }
        if !sender.send(ChatEvent::reply(pin_message, 0)).await {
            return Ok(());
        }

        // SUGGEST: candidate stations, again from the raw message.
        let turn = self.agents.suggest.invoke(message, user_id, session_id).await;
        let suggestion_message = turn.reply().to_string();
        if !sender
            .send(ChatEvent::reply(suggestion_message.clone(), 0))
            .await
        {
            return Ok(());
        }

        // PIN_SUGGESTIONS: pin each suggested station.
        let turn = self
            .agents
            .pin_suggestions
            .invoke(&suggestion_message, user_id, session_id)
            .await;
        let pins_message = turn.reply().to_string();
        if !self.flush_pins(sender, user_id).await {
            return Ok(());
        }
        if !sender
            .send(ChatEvent::reply(pins_message.clone(), 0))
            .await
        {
            return Ok(());
        }

        // REPORT[i]: one area report per slot; the no-report marker ends the
        // loop early, which is normal termination rather than a failure.
        for report in &self.agents.reports {
            let turn = report.invoke(&pins_message, user_id, session_id).await;
            let report_message = turn.reply().to_string();
            if report_message.contains(NO_REPORT_MARKER) {
                break;
            }
            if !sender.send(ChatEvent::reply(report_message, 0)).await {
                return Ok(());
            }
        }

        // FOLLOWUP: prompt for the next question, seeded with the
        // suggestions rather than the last report.
        let turn = self
            .agents
            .followup
            .invoke(&suggestion_message, user_id, session_id)
            .await;
        let _ = sender
            .send(ChatEvent::reply(turn.reply().to_string(), 0))
            .await;

        Ok(())
    }

    async fn continuation(
        &self,
        sender: &ChatStreamSender,
        message: &str,
        user_id: &str,
        session_id: &str,
    ) -> AgentResult<()> {
        let turn = self
            .agents
            .general
            .invoke(message, user_id, session_id)
            .await;
        let reply = turn.reply().to_string();

        if !self.flush_pins(sender, user_id).await {
            return Ok(());
        }
        let _ = sender.send(ChatEvent::reply(reply, 0)).await;

        Ok(())
    }

    /// Drains the user's queued pins onto the stream. Returns `false` when
    /// the consumer is gone.
    async fn flush_pins(&self, sender: &ChatStreamSender, user_id: &str) -> bool {
        for pin in self.pins.drain(user_id).await {
            if !sender.send(ChatEvent::pin(pin)).await {
                return false;
            }
        }
        true
    }
}
