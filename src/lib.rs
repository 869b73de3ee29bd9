//! # Sumika - Real-Estate Exploration Chat Backend
//!
//! Sumika orchestrates a set of LLM agents over a streaming chat endpoint.
//! A first message walks a plan-and-report pipeline (locate stations, suggest
//! candidates, pin them on the map, write area reports); every later message
//! in the same session is handled by a single tool-calling estate agent.
//! Agent output and map pins are pushed to the client as Server-Sent Events.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sumika::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::new()?;
//!     let state = sumika::build_state(&settings)?;
//!     let _app = sumika::create_app(state);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Domain**: request/event types and outbound ports
//! - **Agents**: the agent runtime, tools, and role builders
//! - **Chat**: pin store, event stream, and the two pipelines
//! - **Adapters**: HTTP handlers and external service clients
//! - **Config**: file/env configuration and validation

pub mod adapters;
pub mod agents;
pub mod chat;
pub mod cli;
pub mod config;
pub mod domain;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::adapters::{
    chat_handler, health_handler, ChatState, GoogleGeocoder, GroundedSearchClient, HazardClient,
    PlacesClient, SlidingWindowLimiter, TransitClient,
};
use crate::agents::{build_agent_set, AgentDeps, ConversationRegistry, GeminiRuntime};
use crate::chat::{ChatPipeline, PinStore};
use crate::config::Settings;

/// Creates the Axum application router with all endpoints configured.
pub fn create_app(state: ChatState) -> Router {
    Router::new()
        .route("/health", get(health_handler::health))
        .route("/api/v1/chat", post(chat_handler::chat))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Wires the full runtime graph from settings: external clients, the agent
/// set, the pin store, the conversation registry, and the rate limiter.
pub fn build_state(settings: &Settings) -> anyhow::Result<ChatState> {
    let pins = Arc::new(PinStore::default());
    let registry = Arc::new(ConversationRegistry::default());

    let runtime = Arc::new(GeminiRuntime::new(&settings.llm)?);
    let deps = AgentDeps {
        runtime,
        registry: registry.clone(),
        pins: pins.clone(),
        geocode: Arc::new(GoogleGeocoder::new(&settings.geocode)?),
        transit: Arc::new(TransitClient::new(&settings.transit)?),
        search: Arc::new(GroundedSearchClient::new(&settings.llm)?),
        places: Arc::new(PlacesClient::new(&settings.places)?),
        hazard: Arc::new(HazardClient::new(&settings.hazard)),
    };
    let agents = build_agent_set(&deps, settings.chat.report_slots);

    let pipeline = Arc::new(ChatPipeline::new(agents, pins, registry));
    let limiter = Arc::new(SlidingWindowLimiter::from_settings(&settings.rate_limit));

    Ok(ChatState { pipeline, limiter })
}
