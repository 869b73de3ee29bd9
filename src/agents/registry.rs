//! Conversation registry: which (app, user, session) triples have a run

use std::collections::HashSet;

use tokio::sync::RwLock;

/// Key identifying one long-lived agent run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunKey {
    pub app: String,
    pub user_id: String,
    pub session_id: String,
}

impl RunKey {
    pub fn new(app: &str, user_id: &str, session_id: &str) -> Self {
        Self {
            app: app.to_string(),
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
        }
    }
}

/// Existence records for established agent runs. Purely a boolean gate:
/// transcript content lives with the agent runtime, not here. Entries are
/// never removed; lifetime equals process lifetime.
pub struct ConversationRegistry {
    runs: RwLock<HashSet<RunKey>>,
}

impl ConversationRegistry {
    pub fn new() -> Self {
        Self {
            runs: RwLock::new(HashSet::new()),
        }
    }

    /// True iff a run has previously been marked for this exact triple.
    /// Sole branch condition between the first-turn and continuation
    /// pipelines.
    pub async fn exists(&self, key: &RunKey) -> bool {
        self.runs.read().await.contains(key)
    }

    /// Records the run. Idempotent; called by the first agent invocation of
    /// a triple before it executes.
    pub async fn mark(&self, key: RunKey) {
        self.runs.write().await.insert(key);
    }
}

impl Default for ConversationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exists_flips_after_mark() {
        let registry = ConversationRegistry::new();
        let key = RunKey::new("app", "u1", "s1");

        assert!(!registry.exists(&key).await);
        registry.mark(key.clone()).await;
        assert!(registry.exists(&key).await);

        // idempotent
        registry.mark(key.clone()).await;
        assert!(registry.exists(&key).await);
    }

    #[tokio::test]
    async fn triples_are_independent() {
        let registry = ConversationRegistry::new();
        registry.mark(RunKey::new("app", "u1", "s1")).await;

        assert!(!registry.exists(&RunKey::new("app", "u1", "s2")).await);
        assert!(!registry.exists(&RunKey::new("app", "u2", "s1")).await);
        assert!(!registry.exists(&RunKey::new("other", "u1", "s1")).await);
    }
}
