//! Agent layer: invocation contract, runtime, roles, and tools

pub mod agent;
pub mod error;
pub mod registry;
pub mod roles;
pub mod runtime;
pub mod tools;

pub use agent::{AgentTurn, ChatAgent, RuntimeAgent};
pub use error::{AgentError, AgentResult, LlmError};
pub use registry::{ConversationRegistry, RunKey};
pub use roles::{build_agent_set, AgentDeps};
pub use runtime::{AgentProfile, AgentRuntime, GeminiRuntime};
