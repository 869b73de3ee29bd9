//! Tools callable by agents during a turn

pub mod lookup;
pub mod map;

use async_trait::async_trait;
use serde_json::{json, Value};

pub use lookup::{HazardInfoTool, NearbyBuildingsTool, ReachableStationsTool, WebSearchTool};
pub use map::{AddressPinTool, StationPinTool};

/// A callable capability exposed to the LLM as a function declaration.
/// Failures are reported in-band as `{"status": "error", ...}` payloads so a
/// broken lookup degrades the answer instead of aborting the turn.
#[async_trait]
pub trait AgentTool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the accepted arguments.
    fn parameters(&self) -> Value;

    /// Executes with the arguments decoded from the model's function call.
    /// `user_id` attributes side effects (pin enqueues) to the requester.
    async fn call(&self, args: Value, user_id: &str) -> Value;
}

pub(crate) fn success_payload(message: impl Into<String>) -> Value {
    json!({ "status": "success", "message": message.into() })
}

pub(crate) fn error_payload(message: impl Into<String>) -> Value {
    json!({ "status": "error", "message": message.into() })
}

pub(crate) fn str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_str())
}
