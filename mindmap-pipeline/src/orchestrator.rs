//! Full workflow: plan, inspect the handoff, execute.
//!
//! The debug stage between the two pipelines logs the plan the executor is
//! about to receive, which makes silent handoff failures (an empty or
//! missing `final_output`) visible in the logs.

use crate::executor::build_executor;
use crate::planner::build_planner;
use crate::PipelineContext;
use async_trait::async_trait;
use mindmap_agent::{keys, Agent, SequentialAgent, SessionState};
use std::sync::Arc;

/// Logs the planner → executor handoff.
struct DebugAgent;

#[async_trait]
impl Agent for DebugAgent {
    fn name(&self) -> &str {
        "debug_printer"
    }

    async fn run(&self, session: &SessionState) -> anyhow::Result<()> {
        match session.get_text(keys::FINAL_OUTPUT).await {
            Some(plan) if !plan.trim().is_empty() => {
                tracing::info!(plan = %plan, "Handing plan to executor");
            }
            _ => {
                tracing::warn!("No final_output present at planner/executor handoff");
            }
        }
        Ok(())
    }
}

/// Build the full plan-then-execute workflow for a session.
pub fn build_orchestrator(ctx: &PipelineContext, session: &SessionState) -> Arc<dyn Agent> {
    Arc::new(SequentialAgent::new(
        "orchestrator",
        vec![
            build_planner(ctx, session),
            Arc::new(DebugAgent),
            build_executor(ctx, session),
        ],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, empty_store, ScriptedProvider};
    use mindmap_agent::COMPLETION_PHRASE;

    #[tokio::test]
    async fn orchestrator_chains_planning_and_execution() {
        let (_dir, store) = empty_store().await;
        let provider = ScriptedProvider::new(&[
            // --- planner ---
            "TODO List:\n- [ ] Step 1: search inbound docs",
            COMPLETION_PHRASE,
            "```json\n{\"tool\": \"exit_loop\", \"args\": {}}\n```",
            "- [ ] Step 1: search inbound docs",
            // --- executor ---
            "Searched: found the inbound doc.",
            "- [x] Step 1: search inbound docs -> 1 hit",
            "```json\n{\"tool\": \"exit_loop\", \"args\": {}}\n```",
            "Search found the inbound doc.",
            "The inbound doc exists.",
        ]);
        let ctx = context(provider.clone(), store);

        let session = SessionState::with_query("is there an inbound doc?");
        build_orchestrator(&ctx, &session)
            .run(&session)
            .await
            .unwrap();

        assert_eq!(
            session.get_text(keys::CLEAN_OUTPUT).await.unwrap(),
            "The inbound doc exists."
        );
        // Exit came from the verifier's flag, not budget exhaustion
        assert!(session.flag(keys::LOOP_COMPLETE).await);
        assert_eq!(provider.remaining(), 0);
    }
}
