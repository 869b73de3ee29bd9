//! Core domain types and collaborator ports

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier all chat agents register their runs under. The conversation
/// registry keys on this together with the user and session ids, so the
/// first completed turn of any agent marks the session as established.
pub const APP_NAME: &str = "sumika";

/// Discriminator value for textual reply events.
pub const AGENT_CHANNEL: &str = "real_estate_response";

/// Display name attached to every textual reply event.
pub const AGENT_DISPLAY_NAME: &str = "不動産エージェント";

/// Reply used when an agent turn produced no textual output at all.
pub const NO_OUTPUT_REPLY: &str = "応答を生成できませんでした。";

/// Marker a report agent emits when its slot has no station to report on.
/// The first-turn pipeline stops the report loop when it sees this.
pub const NO_REPORT_MARKER: &str = "出力無";

/// A map marker produced as a side effect of a tool call inside an agent turn.
/// Owned by the pin store until drained into the event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
}

impl Pin {
    pub fn new(lat: f64, lon: f64, name: impl Into<String>) -> Self {
        Self {
            lat,
            lon,
            name: name.into(),
        }
    }
}

/// One server-push event on the chat stream. Serialized as the SSE data
/// payload, externally tagged on `type`. No other event types exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    Pin {
        lat: f64,
        lon: f64,
        name: String,
    },
    AgentResponse {
        agent: String,
        agent_name: String,
        message: String,
        round: u32,
    },
    Error {
        message: String,
    },
}

impl ChatEvent {
    pub fn pin(pin: Pin) -> Self {
        Self::Pin {
            lat: pin.lat,
            lon: pin.lon,
            name: pin.name,
        }
    }

    pub fn reply(message: impl Into<String>, round: u32) -> Self {
        Self::AgentResponse {
            agent: AGENT_CHANNEL.to_string(),
            agent_name: AGENT_DISPLAY_NAME.to_string(),
            message: message.into(),
            round,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

const MESSAGE_MAX_LEN: usize = 1000;
const SESSION_ID_MAX_LEN: usize = 100;

/// Rejection reasons for an inbound chat request. Surfaced as a request-level
/// error before any orchestration runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("message must not be empty")]
    EmptyMessage,

    #[error("message exceeds {MESSAGE_MAX_LEN} characters")]
    MessageTooLong,

    #[error("session_id must not be empty")]
    EmptySessionId,

    #[error("session_id exceeds {SESSION_ID_MAX_LEN} characters")]
    SessionIdTooLong,

    #[error("session_id must contain only alphanumeric characters, hyphens, and underscores")]
    InvalidSessionId,
}

/// Inbound chat request body. `validate` must pass before the request
/// reaches any agent or the pin store.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
}

impl ChatRequest {
    /// Trims the message and checks both fields against the request limits.
    pub fn validate(mut self) -> Result<Self, RequestError> {
        self.message = self.message.trim().to_string();
        if self.message.is_empty() {
            return Err(RequestError::EmptyMessage);
        }
        if self.message.chars().count() > MESSAGE_MAX_LEN {
            return Err(RequestError::MessageTooLong);
        }
        if self.session_id.is_empty() {
            return Err(RequestError::EmptySessionId);
        }
        if self.session_id.chars().count() > SESSION_ID_MAX_LEN {
            return Err(RequestError::SessionIdTooLong);
        }
        if !self
            .session_id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(RequestError::InvalidSessionId);
        }
        Ok(self)
    }
}

/// A geographic coordinate pair returned by geocoding lookups.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// One station reachable from an origin within a time limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReachableStation {
    pub name: String,
    pub line: String,
    pub travel_time_minutes: u32,
    pub lat: f64,
    pub lon: f64,
    /// Monthly one-room rent in units of 10,000 JPY, when the reference
    /// dataset has an entry for the station.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rent_1r: Option<f64>,
}

/// A facility near a coordinate, from the places collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facility {
    pub name: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<u32>,
}

#[async_trait]
pub trait GeocodePort: Send + Sync {
    /// Resolves an address or station name to coordinates, `None` when the
    /// upstream finds nothing usable.
    async fn lookup(&self, query: &str) -> anyhow::Result<Option<Coordinates>>;
}

#[async_trait]
pub trait TransitPort: Send + Sync {
    /// Ranked stations reachable from `origin` within `time_limit_minutes`.
    async fn reachable(
        &self,
        origin: &str,
        time_limit_minutes: u32,
    ) -> anyhow::Result<Vec<ReachableStation>>;
}

#[async_trait]
pub trait SearchPort: Send + Sync {
    /// Free-text answer for a web search query.
    async fn search(&self, query: &str) -> anyhow::Result<String>;
}

#[async_trait]
pub trait PlacesPort: Send + Sync {
    async fn nearby(
        &self,
        lat: f64,
        lon: f64,
        radius_meters: u32,
    ) -> anyhow::Result<Vec<Facility>>;
}

#[async_trait]
pub trait HazardPort: Send + Sync {
    /// Risk-level label for a coordinate, `None` when the layer has no data.
    async fn risk_level(&self, lat: f64, lon: f64) -> anyhow::Result<Option<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(message: &str, session_id: &str) -> ChatRequest {
        ChatRequest {
            message: message.to_string(),
            session_id: session_id.to_string(),
        }
    }

    #[test]
    fn accepts_valid_request() {
        let validated = request("新宿駅に通勤したい", "abc-123_ok").validate().unwrap();
        assert_eq!(validated.message, "新宿駅に通勤したい");
    }

    #[test]
    fn trims_message() {
        let validated = request("  hello  ", "s1").validate().unwrap();
        assert_eq!(validated.message, "hello");
    }

    #[test]
    fn rejects_whitespace_only_message() {
        assert_eq!(
            request("   \t  ", "s1").validate().unwrap_err(),
            RequestError::EmptyMessage
        );
    }

    #[test]
    fn rejects_oversized_message() {
        let long = "a".repeat(1001);
        assert_eq!(
            request(&long, "s1").validate().unwrap_err(),
            RequestError::MessageTooLong
        );
        assert!(request(&"a".repeat(1000), "s1").validate().is_ok());
    }

    #[test]
    fn rejects_session_id_with_invalid_characters() {
        assert_eq!(
            request("hi", "abc 123!").validate().unwrap_err(),
            RequestError::InvalidSessionId
        );
    }

    #[test]
    fn rejects_oversized_session_id() {
        let long = "s".repeat(101);
        assert_eq!(
            request("hi", &long).validate().unwrap_err(),
            RequestError::SessionIdTooLong
        );
    }

    #[test]
    fn chat_event_wire_shape() {
        let event = ChatEvent::pin(Pin::new(35.69, 139.70, "新宿駅"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "pin");
        assert_eq!(json["name"], "新宿駅");

        let event = ChatEvent::reply("こんにちは", 0);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "agent_response");
        assert_eq!(json["agent"], AGENT_CHANNEL);
        assert_eq!(json["agent_name"], AGENT_DISPLAY_NAME);
        assert_eq!(json["round"], 0);
    }
}
