//! Shared session state.
//!
//! A string-keyed map of JSON values that every pipeline stage can read and
//! write. Stages communicate exclusively through named keys: an agent's
//! `output_key` stores its result, and downstream instructions interpolate
//! those keys.
//!
//! The loop-completion flag lives here too. Discipline: the exit tool is
//! the only writer, the loop construct is the only reader, and the loop
//! clears the flag before iterating.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Well-known session keys used by the pipelines.
pub mod keys {
    /// The user's original request.
    pub const QUERY: &str = "query";
    /// Draft plan produced and refined by the planner stages.
    pub const PLAN_DRAFT: &str = "plan_draft";
    /// Critic's change requests (or acceptance sentinel).
    pub const CRITICISM: &str = "criticism";
    /// The presented plan, later rewritten as the execution checklist.
    pub const FINAL_OUTPUT: &str = "final_output";
    /// The worker's report for the step it just executed.
    pub const WORKER_RESULT: &str = "worker_result";
    /// Detailed execution report.
    pub const FINAL_SUMMARY: &str = "final_summary";
    /// Concise final answer.
    pub const CLEAN_OUTPUT: &str = "clean_output";
    /// Default loop-completion flag.
    pub const LOOP_COMPLETE: &str = "loop_complete";
}

/// Shared mutable session state.
///
/// Cheap to clone; all clones observe the same map.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    inner: Arc<RwLock<HashMap<String, Value>>>,
}

impl SessionState {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session seeded with the user's query.
    pub fn with_query(query: &str) -> Self {
        let mut map = HashMap::new();
        map.insert(keys::QUERY.to_string(), Value::String(query.to_string()));
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// Store a JSON value under a key.
    pub async fn set(&self, key: &str, value: Value) {
        self.inner.write().await.insert(key.to_string(), value);
    }

    /// Store a string value under a key.
    pub async fn set_text(&self, key: &str, value: &str) {
        self.set(key, Value::String(value.to_string())).await;
    }

    /// Fetch a value by key.
    pub async fn get(&self, key: &str) -> Option<Value> {
        self.inner.read().await.get(key).cloned()
    }

    /// Fetch a value as display text.
    ///
    /// Strings come back unquoted; other JSON values are rendered compact.
    pub async fn get_text(&self, key: &str) -> Option<String> {
        self.get(key).await.map(|value| match value {
            Value::String(s) => s,
            other => other.to_string(),
        })
    }

    /// Read a boolean flag; missing or non-boolean counts as unset.
    pub async fn flag(&self, key: &str) -> bool {
        matches!(self.get(key).await, Some(Value::Bool(true)))
    }

    /// Set a boolean flag.
    pub async fn set_flag(&self, key: &str, value: bool) {
        self.set(key, Value::Bool(value)).await;
    }

    /// Copy of the whole map, for debugging and tests.
    pub async fn snapshot(&self) -> HashMap<String, Value> {
        self.inner.read().await.clone()
    }
}
