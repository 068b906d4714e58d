//! Loop-exit tool.
//!
//! Sets the session completion flag the surrounding loop watches. This is
//! the single writer of the flag; agents that decide the loop is done call
//! this tool instead of mutating state directly.

use crate::session::SessionState;
use crate::tool::{Tool, ToolResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Tool that signals the enclosing loop to stop.
pub struct ExitLoopTool {
    session: SessionState,
    exit_key: String,
}

impl ExitLoopTool {
    pub fn new(session: SessionState, exit_key: impl Into<String>) -> Self {
        Self {
            session,
            exit_key: exit_key.into(),
        }
    }
}

#[async_trait]
impl Tool for ExitLoopTool {
    fn name(&self) -> &str {
        "exit_loop"
    }

    fn description(&self) -> &str {
        "Signal that the current loop is complete. Call this with no arguments when the task is finished."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, _args: serde_json::Value) -> anyhow::Result<ToolResult> {
        self.session.set_flag(&self.exit_key, true).await;
        tracing::info!(exit_key = %self.exit_key, "Loop exit requested");
        Ok(ToolResult::success("Loop exit signal recorded."))
    }
}

/// Convenience constructor matching the shape of [`crate::tools::store_tools`].
pub fn exit_loop_tool(session: &SessionState, exit_key: &str) -> Arc<dyn Tool> {
    Arc::new(ExitLoopTool::new(session.clone(), exit_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::keys;

    #[tokio::test]
    async fn execute_sets_the_flag() {
        let session = SessionState::new();
        let tool = exit_loop_tool(&session, keys::LOOP_COMPLETE);

        assert!(!session.flag(keys::LOOP_COMPLETE).await);
        let result = tool.execute(serde_json::json!({})).await.unwrap();
        assert!(result.success);
        assert!(session.flag(keys::LOOP_COMPLETE).await);
    }

    #[tokio::test]
    async fn custom_exit_key_is_respected() {
        let session = SessionState::new();
        let tool = exit_loop_tool(&session, "analysis_done");

        tool.execute(serde_json::json!({})).await.unwrap();
        assert!(session.flag("analysis_done").await);
        assert!(!session.flag(keys::LOOP_COMPLETE).await);
    }
}
