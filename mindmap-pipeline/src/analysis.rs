//! Host-driven document analysis.
//!
//! Unlike the planner and executor, the iteration here is controlled by
//! Rust code, not by an agent loop: a todo agent drafts the list of
//! documents to inspect, the host walks the items one at a time running a
//! processor agent per item, and a summarize agent renders the final
//! report. The processor communicates through manager-backed tools
//! (`get_current_todo`, `save_result`), so the cursor only advances when a
//! result is actually recorded. When a run ends without one, the host
//! advances it with a failure record, guaranteeing termination.

use crate::PipelineContext;
use async_trait::async_trait;
use mindmap_agent::{store_tools, Agent, LlmAgent, SessionState, Tool, ToolResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use tokio::sync::Mutex;

/// A single item on the analysis todo list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    /// What to inspect, e.g. `Review "3.1 Inbound Orders"`.
    pub description: String,
    /// Why, e.g. "confirm receiving field definitions".
    pub note: String,
    /// Whether a processor run has handled this item.
    pub processed: bool,
}

/// Verdict for one inspected document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub file_name: String,
    pub is_target: bool,
    pub reason: String,
}

/// Tracks todo progress and collects results.
#[derive(Debug, Default)]
pub struct TodoManager {
    todos: Vec<TodoItem>,
    current_index: usize,
    results: Vec<AnalysisResult>,
    requirement: String,
}

impl TodoManager {
    pub fn new(requirement: &str, todos: Vec<TodoItem>) -> Self {
        Self {
            todos,
            current_index: 0,
            results: Vec::new(),
            requirement: requirement.to_string(),
        }
    }

    /// The item the processor should handle next.
    pub fn current(&self) -> Option<&TodoItem> {
        self.todos.get(self.current_index)
    }

    /// Record a result for the current item and advance the cursor.
    pub fn mark_done(&mut self, result: AnalysisResult) {
        if let Some(item) = self.todos.get_mut(self.current_index) {
            item.processed = true;
        }
        self.results.push(result);
        self.current_index += 1;
    }

    pub fn results(&self) -> &[AnalysisResult] {
        &self.results
    }

    /// File names judged relevant to the requirement.
    pub fn target_files(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| r.is_target)
            .map(|r| r.file_name.clone())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.todos.len()
    }

    pub fn progress(&self) -> String {
        format!("{}/{}", self.current_index, self.todos.len())
    }

    pub fn requirement(&self) -> &str {
        &self.requirement
    }
}

/// Parse the todo agent's raw output into items.
///
/// Expected line shape: `- [ ] <description> | <note>`. Code-fence markers
/// are stripped first; lines that don't match are skipped.
pub fn parse_todo_list(raw: &str) -> Vec<TodoItem> {
    static ITEM_PATTERN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^-\s*\[\s*\]\s*(.+?)\s*\|\s*(.+?)\s*$").unwrap());

    raw.replace("```json", "")
        .replace("```", "")
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            ITEM_PATTERN.captures(line).map(|caps| TodoItem {
                description: caps[1].to_string(),
                note: caps[2].to_string(),
                processed: false,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Manager-backed tools
// ---------------------------------------------------------------------------

struct GetCurrentTodo {
    manager: Arc<Mutex<TodoManager>>,
}

#[async_trait]
impl Tool for GetCurrentTodo {
    fn name(&self) -> &str {
        "get_current_todo"
    }

    fn description(&self) -> &str {
        "Get the single todo item to handle right now."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {}, "required": []})
    }

    async fn execute(&self, _args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let manager = self.manager.lock().await;
        match manager.current() {
            Some(item) => Ok(ToolResult::success(format!(
                "Current item: {}\nNote: {}\nUser requirement: {}",
                item.description,
                item.note,
                manager.requirement()
            ))),
            None => Ok(ToolResult::success("All items have been handled.")),
        }
    }
}

struct SaveResult {
    manager: Arc<Mutex<TodoManager>>,
}

#[async_trait]
impl Tool for SaveResult {
    fn name(&self) -> &str {
        "save_result"
    }

    fn description(&self) -> &str {
        "Record the verdict for the current item and move on. Required before finishing."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_name": { "type": "string", "description": "Document file name, exactly as given" },
                "is_target": { "type": "boolean", "description": "Whether the document is relevant" },
                "reason": { "type": "string", "description": "Short justification" }
            },
            "required": ["file_name", "is_target", "reason"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let result: AnalysisResult = serde_json::from_value(args)
            .map_err(|e| anyhow::anyhow!("invalid save_result arguments: {e}"))?;

        let mut manager = self.manager.lock().await;
        manager.mark_done(result);
        Ok(ToolResult::success(format!(
            "Result saved. Progress: {}",
            manager.progress()
        )))
    }
}

struct GetAllResults {
    manager: Arc<Mutex<TodoManager>>,
}

#[async_trait]
impl Tool for GetAllResults {
    fn name(&self) -> &str {
        "get_all_results"
    }

    fn description(&self) -> &str {
        "List every recorded analysis result."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {}, "required": []})
    }

    async fn execute(&self, _args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let manager = self.manager.lock().await;
        Ok(ToolResult::success(serde_json::to_string(
            manager.results(),
        )?))
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

fn todo_prompt() -> String {
    r#"You are the planning assistant for document requirement analysis. Turn the user's requirement into a todo list of documents to review.

## Procedure
1. Call get_all_modules() to see all modules.
2. For likely-relevant modules, call get_files_by_module(module) to list their files.
3. Strongly recommended: call bm25_search(query) to find the most relevant documents.
4. Decide which documents need reviewing for this requirement.

## Output format
Bullet items, strictly in this shape:

TODO
- [ ] Review "file name" | note about why
- [ ] Review "file name" | note about why
"#
    .to_string()
}

fn processor_prompt() -> String {
    r#"You are the document analysis bot. Your only job is to analyse the CURRENT single todo item and report back.

## Available tools
- get_current_todo(): fetch the current item
- get_content_by_file_name(file_name): read the document
- save_result(file_name, is_target, reason): record your verdict (required!)

## Core rules
1. Single focus: handle only the item get_current_todo() returns.
2. No skipping ahead to other items.
3. Act, don't narrate: finish by actually calling save_result.
4. Consistency: save_result's file_name must equal the name from get_current_todo.

Start by calling get_current_todo().
"#
    .to_string()
}

fn summarize_prompt() -> String {
    r#"You are the results summarizer.

## Task
1. Call get_all_results() to fetch every analysis result.
2. Keep only results where is_target is true.
3. Render them as a list.

## Output format

## Target documents

The following documents are relevant to the requirement and need further analysis:

1. file name - reason
2. file name - reason

Total: N target documents.
"#
    .to_string()
}

/// Final output of an analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Items the todo agent proposed.
    pub todos: Vec<TodoItem>,
    /// One verdict per item.
    pub results: Vec<AnalysisResult>,
    /// File names judged relevant.
    pub target_files: Vec<String>,
    /// Rendered summary.
    pub report: String,
}

/// Key holding the todo agent's raw list.
const TODO_LIST_RAW: &str = "todo_list_raw";

/// Host-driven analysis pipeline.
pub struct AnalysisPipeline {
    ctx: PipelineContext,
}

impl AnalysisPipeline {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    /// Analyse which documents matter for a requirement.
    pub async fn run(&self, requirement: &str) -> anyhow::Result<AnalysisReport> {
        let ctx = &self.ctx;
        let session = SessionState::with_query(requirement);

        // Stage 1: draft the todo list
        let db_tools = store_tools(&ctx.store);
        let todo_tools: Vec<Arc<dyn Tool>> = db_tools
            .iter()
            .filter(|t| {
                matches!(
                    t.name(),
                    "get_all_modules" | "get_files_by_module" | "bm25_search"
                )
            })
            .cloned()
            .collect();

        let todo_agent = LlmAgent::new("todo", ctx.provider.clone(), &ctx.model, todo_prompt())
            .with_tools(todo_tools)
            .with_temperature(ctx.temperature)
            .with_output_key(TODO_LIST_RAW);
        todo_agent.run(&session).await?;

        let raw = session.get_text(TODO_LIST_RAW).await.unwrap_or_default();
        let todos = parse_todo_list(&raw);
        if todos.is_empty() {
            tracing::warn!(requirement = %requirement, "Todo agent produced no parseable items");
            return Ok(AnalysisReport {
                todos: Vec::new(),
                results: Vec::new(),
                target_files: Vec::new(),
                report: String::new(),
            });
        }
        tracing::info!(items = todos.len(), "Analysing todo items");

        // Stage 2: process items one at a time under host control
        let manager = Arc::new(Mutex::new(TodoManager::new(requirement, todos.clone())));

        let mut processor_tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(GetCurrentTodo {
                manager: manager.clone(),
            }),
            Arc::new(SaveResult {
                manager: manager.clone(),
            }),
        ];
        processor_tools.extend(
            db_tools
                .iter()
                .filter(|t| t.name() == "get_content_by_file_name")
                .cloned(),
        );

        let processor = LlmAgent::new(
            "processor",
            ctx.provider.clone(),
            &ctx.model,
            processor_prompt(),
        )
        .with_tools(processor_tools)
        .with_temperature(ctx.temperature);

        for index in 0..todos.len() {
            let before = manager.lock().await.progress();
            tracing::debug!(item = index + 1, progress = %before, "Processing todo item");

            if let Err(e) = processor.run(&session).await {
                tracing::error!(item = index + 1, error = %e, "Processor run failed");
            }

            // Advance past items the processor failed to record, so the
            // pipeline always terminates
            let mut guard = manager.lock().await;
            if guard.current_index == index {
                let description = guard
                    .current()
                    .map(|item| item.description.clone())
                    .unwrap_or_default();
                tracing::warn!(item = index + 1, "Processor did not save a result; marking failed");
                guard.mark_done(AnalysisResult {
                    file_name: description,
                    is_target: false,
                    reason: "processor did not record a result".to_string(),
                });
            }
        }

        // Stage 3: summarize
        let summarize = LlmAgent::new(
            "summarize",
            ctx.provider.clone(),
            &ctx.model,
            summarize_prompt(),
        )
        .with_tools(vec![Arc::new(GetAllResults {
            manager: manager.clone(),
        })])
        .with_temperature(ctx.temperature)
        .with_output_key("target_files");
        summarize.run(&session).await?;

        let guard = manager.lock().await;
        Ok(AnalysisReport {
            todos: todos
                .into_iter()
                .map(|mut item| {
                    item.processed = true;
                    item
                })
                .collect(),
            results: guard.results().to_vec(),
            target_files: guard.target_files(),
            report: session.get_text("target_files").await.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, ScriptedProvider};

    #[test]
    fn parse_accepts_well_formed_lines() {
        let raw = "TODO\n- [ ] Review \"3.1 Inbound\" | check receiving fields\n- [ ] Review \"3.2 Putaway\" | confirm flow";
        let todos = parse_todo_list(raw);
        assert_eq!(todos.len(), 2);
        assert_eq!(todos[0].description, "Review \"3.1 Inbound\"");
        assert_eq!(todos[0].note, "check receiving fields");
        assert!(!todos[0].processed);
    }

    #[test]
    fn parse_skips_noise_and_checked_items() {
        let raw = "```\nTODO\n- [ ] Review \"a\" | note\n- [x] already done | skip\nnot a bullet\n- [ ] missing separator\n```";
        let todos = parse_todo_list(raw);
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].description, "Review \"a\"");
    }

    #[test]
    fn parse_empty_input() {
        assert!(parse_todo_list("").is_empty());
        assert!(parse_todo_list("no items here").is_empty());
    }

    #[test]
    fn manager_tracks_progress_and_targets() {
        let todos = vec![
            TodoItem {
                description: "Review \"a\"".to_string(),
                note: "n1".to_string(),
                processed: false,
            },
            TodoItem {
                description: "Review \"b\"".to_string(),
                note: "n2".to_string(),
                processed: false,
            },
        ];
        let mut manager = TodoManager::new("req", todos);
        assert_eq!(manager.progress(), "0/2");
        assert!(!manager.is_complete());

        manager.mark_done(AnalysisResult {
            file_name: "a".to_string(),
            is_target: true,
            reason: "relevant".to_string(),
        });
        assert_eq!(manager.progress(), "1/2");
        assert_eq!(manager.current().unwrap().description, "Review \"b\"");

        manager.mark_done(AnalysisResult {
            file_name: "b".to_string(),
            is_target: false,
            reason: "unrelated".to_string(),
        });
        assert!(manager.is_complete());
        assert!(manager.current().is_none());
        assert_eq!(manager.target_files(), vec!["a"]);
    }

    async fn seeded_store() -> (tempfile::TempDir, mindmap_store::DocumentStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = mindmap_store::DocumentStore::open(&dir.path().join("analysis.db")).unwrap();
        store
            .insert(
                "3. Receiving",
                Some("3.1 Inbound"),
                Some("Inbound order receiving flow."),
                None,
            )
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn pipeline_collects_results_per_item() {
        let (_dir, store) = seeded_store().await;
        let provider = ScriptedProvider::new(&[
            // todo agent
            "TODO\n- [ ] Review \"3.1 Inbound\" | receiving fields\n- [ ] Review \"9.9 Ghost\" | long shot",
            // item 1: fetch, read, save, finish
            "```json\n{\"tool\": \"get_current_todo\", \"args\": {}}\n```",
            "```json\n{\"tool\": \"get_content_by_file_name\", \"args\": {\"file_name\": \"3.1 Inbound\"}}\n```",
            "```json\n{\"tool\": \"save_result\", \"args\": {\"file_name\": \"3.1 Inbound\", \"is_target\": true, \"reason\": \"covers receiving\"}}\n```",
            "Item one done.",
            // item 2: fetch, save negative, finish
            "```json\n{\"tool\": \"get_current_todo\", \"args\": {}}\n```",
            "```json\n{\"tool\": \"save_result\", \"args\": {\"file_name\": \"9.9 Ghost\", \"is_target\": false, \"reason\": \"no such document\"}}\n```",
            "Item two done.",
            // summarize
            "## Target documents\n\n1. 3.1 Inbound - covers receiving\n\nTotal: 1 target documents.",
        ]);
        let ctx = context(provider.clone(), store);

        let report = AnalysisPipeline::new(ctx)
            .run("which docs describe receiving?")
            .await
            .unwrap();

        assert_eq!(report.todos.len(), 2);
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.target_files, vec!["3.1 Inbound"]);
        assert!(report.report.contains("Total: 1"));
        assert_eq!(provider.remaining(), 0);
    }

    #[tokio::test]
    async fn unresponsive_processor_still_terminates() {
        let (_dir, store) = seeded_store().await;
        let provider = ScriptedProvider::new(&[
            "TODO\n- [ ] Review \"3.1 Inbound\" | receiving fields",
            // processor never calls save_result
            "I think it is probably relevant.",
            // summarize
            "## Target documents\n\nTotal: 0 target documents.",
        ]);
        let ctx = context(provider.clone(), store);

        let report = AnalysisPipeline::new(ctx)
            .run("which docs describe receiving?")
            .await
            .unwrap();

        assert_eq!(report.results.len(), 1);
        assert!(!report.results[0].is_target);
        assert!(report.results[0].reason.contains("did not record"));
        assert!(report.target_files.is_empty());
    }

    #[tokio::test]
    async fn empty_todo_list_short_circuits() {
        let (_dir, store) = seeded_store().await;
        let provider = ScriptedProvider::new(&["I could not find anything to review."]);
        let ctx = context(provider.clone(), store);

        let report = AnalysisPipeline::new(ctx).run("nonsense").await.unwrap();
        assert!(report.todos.is_empty());
        assert!(report.results.is_empty());
        assert!(report.report.is_empty());
    }
}
