//! Execution pipeline: work through the plan checklist one item at a time,
//! judge each result, and stop when everything is checked off.
//!
//! Stages and their session keys:
//! 1. execution loop: `worker` → `worker_result`, `judge` rewrites
//!    `final_output` (the checklist), `verifier` exits via the loop flag
//!    once every item is `[x]`
//! 2. `summarizer` → `final_summary`
//! 3. `clean_answer` → `clean_output`

use crate::PipelineContext;
use mindmap_agent::{
    exit_loop_tool, keys, store_tools, Agent, LlmAgent, LoopAgent, SequentialAgent, SessionState,
};
use std::sync::Arc;

fn worker_prompt() -> String {
    r#"You are a task executor.

## Input
- Checklist: {final_output}

## Task
1. Read the checklist above.
2. Find the FIRST item still marked `[ ]` (not done).
3. Use the database tools to perform that item's action.
4. Report what you did and state exactly which step you completed.

(Execute one step only.)
"#
    .to_string()
}

fn judge_prompt() -> String {
    r#"You are a strict result judge.

## Inputs
- Current checklist: {final_output}
- Worker report: {worker_result}

## Task
1. Decide whether the worker actually completed the current item.
   - Success: executed without errors and met the goal.
   - Failure: errors, missing documents, or other anomalies.
2. Update the checklist:
   - On success: flip that item from `[ ]` to `[x]` and append a short
     result note to the line (e.g. `- [x] search docs -> found 5 files: a, b...`).
   - On failure: keep `[ ]` and add a line below it:
     `  - failure: (short reason)` so the worker can retry informed.
3. Output the COMPLETE updated markdown checklist and nothing else.
   It replaces the stored checklist verbatim, so keep every item.
"#
    .to_string()
}

fn verifier_prompt() -> String {
    r#"You are an acceptance checker.

## Input
- Current checklist: {final_output}

## Task
Check whether EVERY item is marked `[x]`.

- If all items are done: call the exit_loop tool (exact tool name
  "exit_loop", no prefix) to finish the task.
- If items remain: output one short sentence encouraging the team to
  continue with the next step.
"#
    .to_string()
}

fn summarizer_prompt() -> String {
    r#"You are a project summarizer. Record and summarize everything produced during execution.

## Inputs
- Original request: {query}
- Execution record:
{final_output}

## Task
Answer the original request using the execution record.

## Output format
This is the DETAILED report: include the important data, file lists, and
steps from the execution. Organize it clearly.
"#
    .to_string()
}

fn clean_answer_prompt() -> String {
    r#"You are a concise responder.

## Inputs
- Original request: {query}
- Detailed summary: {final_summary}

## Task
Give the most direct, minimal answer to the original request based on the
detailed summary.

## Output rules
- Conclusion and a brief reason only.
- No execution traces, search steps, or debugging noise unless the request
  asked about the process.
- Answer like a consultant delivering the bottom line.
"#
    .to_string()
}

/// Build the execution pipeline for a session.
pub fn build_executor(ctx: &PipelineContext, session: &SessionState) -> Arc<dyn Agent> {
    let db_tools = store_tools(&ctx.store);

    let worker = LlmAgent::new("worker", ctx.provider.clone(), &ctx.model, worker_prompt())
        .with_tools(db_tools)
        .with_temperature(ctx.temperature)
        .with_output_key(keys::WORKER_RESULT);

    let judge = LlmAgent::new("judge", ctx.provider.clone(), &ctx.model, judge_prompt())
        .with_temperature(ctx.temperature)
        // Overwrites the checklist in place
        .with_output_key(keys::FINAL_OUTPUT);

    let verifier = LlmAgent::new(
        "verifier",
        ctx.provider.clone(),
        &ctx.model,
        verifier_prompt(),
    )
    .with_tools(vec![exit_loop_tool(session, keys::LOOP_COMPLETE)])
    .with_temperature(ctx.temperature);

    let execution_loop = LoopAgent::new(
        "execution_loop",
        vec![Arc::new(worker), Arc::new(judge), Arc::new(verifier)],
        ctx.execution_iterations,
    );

    let summarizer = LlmAgent::new(
        "summarizer",
        ctx.provider.clone(),
        &ctx.model,
        summarizer_prompt(),
    )
    .with_temperature(ctx.temperature)
    .with_output_key(keys::FINAL_SUMMARY);

    let clean_answer = LlmAgent::new(
        "clean_answer",
        ctx.provider.clone(),
        &ctx.model,
        clean_answer_prompt(),
    )
    .with_temperature(ctx.temperature)
    .with_output_key(keys::CLEAN_OUTPUT);

    Arc::new(SequentialAgent::new(
        "executor",
        vec![
            Arc::new(execution_loop),
            Arc::new(summarizer),
            Arc::new(clean_answer),
        ],
    ))
}
