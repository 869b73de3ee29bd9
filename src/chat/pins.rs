//! Per-user queue of map pins produced by tool calls during agent turns

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::domain::Pin;

/// Process-wide store of pending pins, keyed by user id. Constructed once
/// at startup and injected into the tools that produce pins and the
/// pipeline that drains them.
pub struct PinStore {
    queues: Mutex<HashMap<String, Vec<Pin>>>,
}

impl PinStore {
    pub fn new() -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
        }
    }

    /// Appends a pin to the user's queue. Unbounded; callable from inside
    /// tool code at any depth of an agent turn.
    pub async fn enqueue(&self, user_id: &str, pin: Pin) {
        let mut queues = self.queues.lock().await;
        queues.entry(user_id.to_string()).or_default().push(pin);
    }

    /// Removes and returns every queued pin for the user, last-enqueued
    /// first. Unknown users yield an empty vec. The removal is atomic with
    /// respect to concurrent enqueues for the same key.
    pub async fn drain(&self, user_id: &str) -> Vec<Pin> {
        let mut queues = self.queues.lock().await;
        match queues.remove(user_id) {
            Some(mut pins) => {
                pins.reverse();
                pins
            }
            None => Vec::new(),
        }
    }
}

impl Default for PinStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drain_of_unknown_user_is_empty() {
        let store = PinStore::new();
        assert!(store.drain("nobody").await.is_empty());
    }

    #[tokio::test]
    async fn drain_returns_lifo_order_and_clears() {
        let store = PinStore::new();
        let p1 = Pin::new(35.0, 139.0, "a");
        let p2 = Pin::new(36.0, 140.0, "b");
        let p3 = Pin::new(37.0, 141.0, "c");
        store.enqueue("u1", p1.clone()).await;
        store.enqueue("u1", p2.clone()).await;
        store.enqueue("u1", p3.clone()).await;

        assert_eq!(store.drain("u1").await, vec![p3, p2, p1]);
        assert!(store.drain("u1").await.is_empty());
    }

    #[tokio::test]
    async fn queues_are_isolated_per_user() {
        let store = PinStore::new();
        store.enqueue("u1", Pin::new(1.0, 2.0, "one")).await;
        store.enqueue("u2", Pin::new(3.0, 4.0, "two")).await;

        let drained = store.drain("u1").await;
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].name, "one");
        assert_eq!(store.drain("u2").await.len(), 1);
    }
}
