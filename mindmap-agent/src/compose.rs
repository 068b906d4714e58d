//! Agent trait and composition: sequential chains and bounded loops.
//!
//! A loop's termination condition is a shared boolean in session state
//! rather than a fixed iteration count: any participant may end the loop by
//! setting the flag (via the exit tool), and the flag is checked after each
//! participant so the exit takes effect immediately.

use crate::session::{keys, SessionState};
use async_trait::async_trait;
use std::sync::Arc;

/// Sentinel the critic emits to accept a plan.
///
/// The refiner scans the criticism for this phrase and exits the refinement
/// loop when it appears.
pub const COMPLETION_PHRASE: &str = "PLAN APPROVED";

/// A pipeline participant.
///
/// Agents communicate only through the shared [`SessionState`]; `run`
/// reads its inputs from named keys and writes its outputs back.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Agent name, used in logs.
    fn name(&self) -> &str;

    /// Execute against the shared session.
    async fn run(&self, session: &SessionState) -> anyhow::Result<()>;
}

/// Runs sub-agents in order, failing fast on the first error.
pub struct SequentialAgent {
    name: String,
    sub_agents: Vec<Arc<dyn Agent>>,
}

impl SequentialAgent {
    pub fn new(name: impl Into<String>, sub_agents: Vec<Arc<dyn Agent>>) -> Self {
        Self {
            name: name.into(),
            sub_agents,
        }
    }
}

#[async_trait]
impl Agent for SequentialAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, session: &SessionState) -> anyhow::Result<()> {
        for agent in &self.sub_agents {
            tracing::debug!(pipeline = %self.name, stage = %agent.name(), "Running stage");
            agent.run(session).await?;
        }
        Ok(())
    }
}

/// Bounded loop over sub-agents with programmatic exit.
///
/// Each pass runs every participant in order. The completion flag is
/// cleared on entry and checked after every participant; when set, the
/// loop stops immediately. If `max_iterations` passes complete without
/// the flag being set, the loop gives up and logs the exhausted budget.
pub struct LoopAgent {
    name: String,
    sub_agents: Vec<Arc<dyn Agent>>,
    max_iterations: usize,
    exit_key: String,
}

impl LoopAgent {
    pub fn new(
        name: impl Into<String>,
        sub_agents: Vec<Arc<dyn Agent>>,
        max_iterations: usize,
    ) -> Self {
        Self {
            name: name.into(),
            sub_agents,
            max_iterations,
            exit_key: keys::LOOP_COMPLETE.to_string(),
        }
    }

    /// Use a non-default completion flag key.
    pub fn with_exit_key(mut self, exit_key: impl Into<String>) -> Self {
        self.exit_key = exit_key.into();
        self
    }
}

#[async_trait]
impl Agent for LoopAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, session: &SessionState) -> anyhow::Result<()> {
        // A stale flag from an earlier loop must not end this one
        session.set_flag(&self.exit_key, false).await;

        for pass in 1..=self.max_iterations {
            for agent in &self.sub_agents {
                tracing::debug!(
                    loop_name = %self.name,
                    pass,
                    stage = %agent.name(),
                    "Running loop stage"
                );
                agent.run(session).await?;

                if session.flag(&self.exit_key).await {
                    tracing::info!(
                        loop_name = %self.name,
                        pass,
                        stage = %agent.name(),
                        "Loop exited via completion flag"
                    );
                    return Ok(());
                }
            }
        }

        tracing::warn!(
            loop_name = %self.name,
            max_iterations = self.max_iterations,
            "Loop budget exhausted without completion signal"
        );
        Ok(())
    }
}
