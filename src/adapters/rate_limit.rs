//! Per-client sliding-window request governor for the chat endpoint

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::RateLimitSettings;

/// In-memory sliding window, keyed by client. Timestamps older than the
/// window are pruned on each check; nothing survives a process restart.
pub struct SlidingWindowLimiter {
    enabled: bool,
    limit: usize,
    window: Duration,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            enabled: true,
            limit,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self {
            enabled: settings.enabled,
            limit: settings.limit,
            window: Duration::from_secs(settings.window_seconds),
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Records the request and returns `true` if the client is within the
    /// cap, `false` once `limit` requests have already landed inside the
    /// window. Rejected requests are not recorded.
    pub fn allow(&self, client_key: &str) -> bool {
        if !self.enabled {
            return true;
        }

        let now = Instant::now();
        let mut hits = self.hits.lock().expect("rate limiter lock poisoned");
        let window = hits.entry(client_key.to_string()).or_default();

        while let Some(oldest) = window.front() {
            if now.duration_since(*oldest) >= self.window {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() >= self.limit {
            return false;
        }

        window.push_back(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn eleventh_request_in_window_is_rejected() {
        let limiter = SlidingWindowLimiter::new(10, Duration::from_secs(60));

        for _ in 0..10 {
            assert!(limiter.allow("1.2.3.4"));
        }
        assert!(!limiter.allow("1.2.3.4"));
    }

    #[tokio::test(start_paused = true)]
    async fn window_elapse_frees_capacity() {
        let limiter = SlidingWindowLimiter::new(10, Duration::from_secs(60));

        for _ in 0..10 {
            assert!(limiter.allow("1.2.3.4"));
        }
        assert!(!limiter.allow("1.2.3.4"));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(limiter.allow("1.2.3.4"));
    }

    #[tokio::test(start_paused = true)]
    async fn clients_are_limited_independently() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_secs(60));

        assert!(limiter.allow("a"));
        assert!(!limiter.allow("a"));
        assert!(limiter.allow("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_requests_are_not_recorded() {
        let limiter = SlidingWindowLimiter::new(2, Duration::from_secs(60));

        assert!(limiter.allow("a"));
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(limiter.allow("a"));
        assert!(!limiter.allow("a"));

        // The first hit leaves the window; the rejection above must not
        // have consumed a slot.
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(limiter.allow("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_limiter_admits_everything() {
        let limiter = SlidingWindowLimiter::from_settings(&RateLimitSettings {
            enabled: false,
            limit: 1,
            window_seconds: 60,
        });

        assert!(limiter.allow("a"));
        assert!(limiter.allow("a"));
        assert!(limiter.allow("a"));
    }
}
