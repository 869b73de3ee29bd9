//! Outbound adapters and HTTP handlers.

pub mod chat_handler;
pub mod geocode;
pub mod hazard;
pub mod health_handler;
pub mod places;
pub mod rate_limit;
pub mod transit;
pub mod web_search;

pub use chat_handler::{chat, ChatState};
pub use geocode::GoogleGeocoder;
pub use hazard::HazardClient;
pub use health_handler::health;
pub use places::PlacesClient;
pub use rate_limit::SlidingWindowLimiter;
pub use transit::TransitClient;
pub use web_search::GroundedSearchClient;
