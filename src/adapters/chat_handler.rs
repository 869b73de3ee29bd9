//! Streaming chat endpoint

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        AppendHeaders, IntoResponse, Response,
    },
    Json,
};
use futures::StreamExt;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::adapters::rate_limit::SlidingWindowLimiter;
use crate::chat::ChatPipeline;
use crate::domain::{ChatRequest, RequestError};

/// Shared state for the chat routes.
#[derive(Clone)]
pub struct ChatState {
    pub pipeline: Arc<ChatPipeline>,
    pub limiter: Arc<SlidingWindowLimiter>,
}

/// Request-level rejections, surfaced before any orchestration starts.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(#[from] RequestError),

    #[error("Rate limit exceeded")]
    RateLimited,
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = match self {
            ChatError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ChatError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        };
        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// POST /api/v1/chat
///
/// Validates the request, applies the rate limit, then answers with a
/// server-sent-event stream of pin / agent_response / error events. The
/// stream stays open until the pipeline finishes. Proxy buffering is
/// disabled so events reach the client as they are produced.
pub async fn chat(
    State(state): State<ChatState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, ChatError> {
    let client = client_key(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    if !state.limiter.allow(&client) {
        return Err(ChatError::RateLimited);
    }

    let request = request.validate()?;
    let session_id = request.session_id;
    // User identity equals the client-supplied session id.
    let user_id = session_id.clone();

    info!(session_id, client, "chat request accepted");

    let stream = state
        .pipeline
        .run(request.message, user_id, session_id)
        .map(|event| Event::default().json_data(&event));

    Ok((
        AppendHeaders([("x-accel-buffering", "no")]),
        Sse::new(stream).keep_alive(KeepAlive::default()),
    ))
}

/// Client key for rate limiting: first X-Forwarded-For hop when present,
/// otherwise the peer address.
fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return forwarded.to_string();
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarded_header_wins_over_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        let peer: SocketAddr = "192.0.2.1:443".parse().unwrap();

        assert_eq!(client_key(&headers, Some(peer)), "203.0.113.7");
    }

    #[test]
    fn falls_back_to_peer_then_unknown() {
        let headers = HeaderMap::new();
        let peer: SocketAddr = "192.0.2.1:443".parse().unwrap();

        assert_eq!(client_key(&headers, Some(peer)), "192.0.2.1");
        assert_eq!(client_key(&headers, None), "unknown");
    }
}
