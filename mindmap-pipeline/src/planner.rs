//! Planning pipeline: draft a TODO-list plan, refine it through a bounded
//! critique loop, then present the result.
//!
//! Stages and their session keys:
//! 1. `initial_planner` → `plan_draft`
//! 2. refinement loop (`critic` → `criticism`, `refiner` → `plan_draft`,
//!    exits via the loop flag when the critic accepts)
//! 3. `presenter` → `final_output`

use crate::PipelineContext;
use mindmap_agent::{
    exit_loop_tool, keys, store_tools, Agent, LlmAgent, LoopAgent, SequentialAgent, SessionState,
    COMPLETION_PHRASE,
};
use std::sync::Arc;

fn initial_planner_prompt() -> String {
    r#"You are a task-planning assistant. Propose an initial execution plan for the user's request.

## Steps
1. Understand the core goal of the request.
2. Survey the knowledge base with the provided tools (get_all_modules, bm25_search) to find relevant documents.
3. Write a TODO list based on what you found.

## Rules
- Be concrete: reference documents and tools that actually exist.
- Each task must be a minimal executable unit; avoid vague items.

## Output format
Output the plan in exactly this markdown shape:

TODO List:
- [ ] Step 1: (concrete action)
- [ ] Step 2: ...
- [ ] Step N
"#
    .to_string()
}

fn critic_prompt() -> String {
    format!(
        r#"You are a pragmatic plan reviewer. Check whether the draft plan is feasible, complete, and matches the user's request.

## Inputs
- User request: {{query}}
- Current plan: {{plan_draft}}

## Review criteria
1. Completeness: are key steps missing?
2. Feasibility: does the ordering make sense?
3. Granularity: is each task a minimal executable unit?
4. Pragmatism: if the plan is reasonable and executable, let it pass; do not nitpick.

## Output rules
- If the plan has no major problems, output exactly: "{COMPLETION_PHRASE}"
  (no other text, no suggestions)
- Only when you find a major error or a critical gap, list the specific changes needed
  and do NOT output the approval phrase.
"#
    )
}

fn refiner_prompt() -> String {
    format!(
        r#"You are a plan-refinement expert. Revise the plan according to the review.

## Inputs
- Original request: {{query}}
- Review feedback: {{criticism}}
- Current plan: {{plan_draft}}

## Procedure
1. If the review feedback contains "{COMPLETION_PHRASE}", the plan is done:
   call the exit_loop tool through the tool-calling mechanism.
   Do not print raw JSON as your answer text and do not fake the call.
2. Otherwise revise the plan per the feedback and output the corrected
   markdown TODO list (same format, nothing else).
"#
    )
}

fn presenter_prompt() -> String {
    r#"You are a professional presenter. Deliver the final plan to the user as clean markdown.

## Input
- Final plan: {plan_draft}

## Task
Output the final TODO list directly. No preamble; light formatting polish is fine.
"#
    .to_string()
}

/// Build the planning pipeline for a session.
pub fn build_planner(ctx: &PipelineContext, session: &SessionState) -> Arc<dyn Agent> {
    let db_tools = store_tools(&ctx.store);

    let initial_planner = LlmAgent::new(
        "initial_planner",
        ctx.provider.clone(),
        &ctx.model,
        initial_planner_prompt(),
    )
    .with_tools(db_tools.clone())
    .with_temperature(ctx.temperature)
    .with_output_key(keys::PLAN_DRAFT);

    let critic = LlmAgent::new("critic", ctx.provider.clone(), &ctx.model, critic_prompt())
        .with_tools(db_tools.clone())
        .with_temperature(ctx.temperature)
        .with_output_key(keys::CRITICISM);

    let mut refiner_tools = vec![exit_loop_tool(session, keys::LOOP_COMPLETE)];
    refiner_tools.extend(db_tools);
    let refiner = LlmAgent::new(
        "refiner",
        ctx.provider.clone(),
        &ctx.model,
        refiner_prompt(),
    )
    .with_tools(refiner_tools)
    .with_temperature(ctx.temperature)
    .with_output_key(keys::PLAN_DRAFT);

    let refinement_loop = LoopAgent::new(
        "refinement_loop",
        vec![Arc::new(critic), Arc::new(refiner)],
        ctx.refinement_iterations,
    );

    let presenter = LlmAgent::new(
        "presenter",
        ctx.provider.clone(),
        &ctx.model,
        presenter_prompt(),
    )
    .with_temperature(ctx.temperature)
    .with_output_key(keys::FINAL_OUTPUT);

    Arc::new(SequentialAgent::new(
        "planner",
        vec![
            Arc::new(initial_planner),
            Arc::new(refinement_loop),
            Arc::new(presenter),
        ],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, empty_store, ScriptedProvider};

    #[tokio::test]
    async fn planner_converges_when_critic_accepts() {
        let (_dir, store) = empty_store().await;
        let provider = ScriptedProvider::new(&[
            // initial_planner
            "TODO List:\n- [ ] Step 1: search docs",
            // critic accepts on first pass
            COMPLETION_PHRASE,
            // refiner sees the phrase and exits the loop
            "```json\n{\"tool\": \"exit_loop\", \"args\": {}}\n```",
            // presenter
            "## Final Plan\n- [ ] Step 1: search docs",
        ]);
        let ctx = context(provider.clone(), store);

        let session = SessionState::with_query("find inbound docs");
        let planner = build_planner(&ctx, &session);
        planner.run(&session).await.unwrap();

        assert_eq!(
            session.get_text(keys::FINAL_OUTPUT).await.unwrap(),
            "## Final Plan\n- [ ] Step 1: search docs"
        );
        assert_eq!(provider.remaining(), 0);
    }

    #[tokio::test]
    async fn planner_refines_before_accepting() {
        let (_dir, store) = empty_store().await;
        let provider = ScriptedProvider::new(&[
            // initial_planner
            "TODO List:\n- [ ] Step 1: vague idea",
            // pass 1: critic rejects, refiner rewrites
            "Step 1 is too vague; split it.",
            "TODO List:\n- [ ] Step 1: list modules\n- [ ] Step 2: read the inbound doc",
            // pass 2: critic accepts, refiner exits
            COMPLETION_PHRASE,
            "```json\n{\"tool\": \"exit_loop\", \"args\": {}}\n```",
            // presenter
            "Final: two steps.",
        ]);
        let ctx = context(provider.clone(), store);

        let session = SessionState::with_query("analyse inbound flow");
        build_planner(&ctx, &session).run(&session).await.unwrap();

        assert!(session
            .get_text(keys::PLAN_DRAFT)
            .await
            .unwrap()
            .contains("Step 2"));
        assert_eq!(
            session.get_text(keys::FINAL_OUTPUT).await.unwrap(),
            "Final: two steps."
        );
        assert_eq!(provider.remaining(), 0);
    }

    #[tokio::test]
    async fn refinement_loop_stops_at_budget() {
        let (_dir, store) = empty_store().await;
        // Critic never accepts; refiner keeps rewriting. 3 passes = 6 loop
        // responses, plus initial planner and presenter.
        let provider = ScriptedProvider::new(&[
            "TODO List:\n- [ ] Step 1",
            "reject 1",
            "rewrite 1",
            "reject 2",
            "rewrite 2",
            "reject 3",
            "rewrite 3",
            "Presented anyway.",
        ]);
        let ctx = context(provider.clone(), store);

        let session = SessionState::with_query("q");
        build_planner(&ctx, &session).run(&session).await.unwrap();

        assert_eq!(
            session.get_text(keys::PLAN_DRAFT).await.unwrap(),
            "rewrite 3"
        );
        assert_eq!(provider.remaining(), 0);
    }
}
