//! Prompt-driven agent with a bounded tool-call loop.
//!
//! An `LlmAgent` renders its instruction template against the session
//! (`{key}` placeholders pull session values), then converses with the
//! provider: tool-call JSON in a reply is executed and the results fed
//! back; a plain-text reply ends the loop and is written to the agent's
//! `output_key`.

use crate::compose::Agent;
use crate::provider::Provider;
use crate::session::SessionState;
use crate::tool::Tool;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;

/// Maximum number of tool-calling rounds per agent run.
const MAX_TOOL_ROUNDS: usize = 10;

/// Parsed tool call from an LLM response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// A named, prompt-configured agent.
pub struct LlmAgent {
    name: String,
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f64,
    instruction: String,
    tools: Vec<Arc<dyn Tool>>,
    output_key: Option<String>,
}

impl LlmAgent {
    pub fn new(
        name: impl Into<String>,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        instruction: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            model: model.into(),
            temperature: 0.7,
            instruction: instruction.into(),
            tools: Vec::new(),
            output_key: None,
        }
    }

    pub fn with_tools(mut self, tools: Vec<Arc<dyn Tool>>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = Some(key.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Render `{key}` placeholders from session state.
    ///
    /// Unknown keys and non-placeholder braces (JSON examples in prompts)
    /// are left untouched.
    async fn render_instruction(&self, session: &SessionState) -> String {
        render_template(&self.instruction, session).await
    }

    /// Tool-usage section appended to the system prompt.
    fn tool_prompt(&self) -> String {
        let mut prompt = String::from("\n\n## Available Tools\n\n");
        prompt.push_str("To use a tool, respond with only a JSON block:\n");
        prompt.push_str("```json\n{\"tool\": \"tool_name\", \"args\": {\"param\": \"value\"}}\n```\n\n");
        prompt.push_str(
            "After the tool runs you will receive its result. \
             Keep calling tools as needed, then give your final answer as plain text.\n\n",
        );
        prompt.push_str("### Tools:\n\n");
        for tool in &self.tools {
            let _ = writeln!(prompt, "**{}**: {}", tool.name(), tool.description());
            let _ = writeln!(prompt, "Parameters: {}", tool.parameters_schema());
        }
        prompt
    }

    async fn execute_tool(&self, call: &ToolCall) -> String {
        let Some(tool) = self.tools.iter().find(|t| t.name() == call.tool) else {
            tracing::warn!(agent = %self.name, tool = %call.tool, "Unknown tool requested");
            return format!("Tool '{}' not found.", call.tool);
        };

        tracing::info!(agent = %self.name, tool = %call.tool, "Executing tool");
        match tool.execute(call.args.clone()).await {
            Ok(result) if result.success => {
                format!("Tool '{}' succeeded:\n{}", call.tool, result.output)
            }
            Ok(result) => {
                let error = result.error.unwrap_or_else(|| "Unknown error".to_string());
                tracing::warn!(agent = %self.name, tool = %call.tool, error = %error, "Tool failed");
                format!("Tool '{}' failed: {error}", call.tool)
            }
            Err(e) => {
                tracing::error!(agent = %self.name, tool = %call.tool, error = %e, "Tool error");
                format!("Tool '{}' error: {e}", call.tool)
            }
        }
    }
}

#[async_trait]
impl Agent for LlmAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, session: &SessionState) -> anyhow::Result<()> {
        let mut system = self.render_instruction(session).await;
        if !self.tools.is_empty() {
            system.push_str(&self.tool_prompt());
        }

        let user_message = session
            .get_text(crate::session::keys::QUERY)
            .await
            .unwrap_or_else(|| "Proceed with your task.".to_string());

        let mut conversation = vec![format!("User: {user_message}")];

        for round in 1..=MAX_TOOL_ROUNDS {
            let full_message = conversation.join("\n\n");
            let response = self
                .provider
                .chat_with_system(Some(&system), &full_message, &self.model, self.temperature)
                .await?;

            tracing::debug!(
                agent = %self.name,
                round,
                response = %truncate(&response, 200),
                "LLM response"
            );

            if let Some(calls) = parse_tool_calls(&response) {
                let mut tool_results = Vec::with_capacity(calls.len());
                for call in &calls {
                    tool_results.push(self.execute_tool(call).await);
                }
                conversation.push(format!("Assistant: {response}"));
                conversation.push(format!("Tool Results:\n{}", tool_results.join("\n\n")));

                // The exit tool may have ended the surrounding loop; no
                // point asking the model for more once it has signalled.
                // A tool-call turn is not a final response, so the
                // output key keeps whatever it already holds.
                if calls.iter().any(|c| c.tool == "exit_loop") {
                    return Ok(());
                }
            } else {
                let final_text = response.trim();
                if let Some(key) = &self.output_key {
                    session.set_text(key, final_text).await;
                    tracing::debug!(agent = %self.name, output_key = %key, "Stored agent output");
                }
                return Ok(());
            }
        }

        tracing::warn!(agent = %self.name, rounds = MAX_TOOL_ROUNDS, "Tool round budget exhausted");
        Ok(())
    }
}

/// Render `{key}` placeholders in a template from session values.
pub(crate) async fn render_template(template: &str, session: &SessionState) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((start, ch)) = chars.next() {
        if ch != '{' {
            rendered.push(ch);
            continue;
        }

        // Collect a candidate key up to the closing brace
        let rest = &template[start + 1..];
        let Some(end) = rest.find('}') else {
            rendered.push(ch);
            continue;
        };
        let key = &rest[..end];
        let is_key = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

        if is_key {
            if let Some(value) = session.get_text(key).await {
                rendered.push_str(&value);
                // Skip past the placeholder
                for _ in 0..=end {
                    chars.next();
                }
                continue;
            }
        }
        rendered.push(ch);
    }

    rendered
}

/// Parse tool calls out of an LLM response.
///
/// Accepts fenced ```json blocks and bare inline `{"tool": ...}` objects;
/// a block may hold one call or an array of calls.
fn parse_tool_calls(response: &str) -> Option<Vec<ToolCall>> {
    let mut calls = Vec::new();

    for block in extract_json_blocks(response) {
        if let Ok(call) = serde_json::from_str::<ToolCall>(&block) {
            calls.push(call);
        } else if let Ok(multi) = serde_json::from_str::<Vec<ToolCall>>(&block) {
            calls.extend(multi);
        }
    }

    if calls.is_empty() {
        if let Some(call) = find_inline_tool_call(response) {
            calls.push(call);
        }
    }

    if calls.is_empty() {
        None
    } else {
        Some(calls)
    }
}

/// Contents of ```json fenced blocks.
fn extract_json_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("```json") {
        let after = &rest[start + 7..];
        let Some(end) = after.find("```") else {
            break;
        };
        blocks.push(after[..end].trim().to_string());
        rest = &after[end + 3..];
    }

    blocks
}

/// First bare `{"tool": ...}` object in the text, if it parses.
fn find_inline_tool_call(response: &str) -> Option<ToolCall> {
    let patterns = [r#"{"tool":"#, r#"{ "tool":"#, r#"{"tool" :"#];

    for pattern in patterns {
        if let Some(start) = response.find(pattern) {
            let rest = &response[start..];
            if let Some(end) = find_matching_brace(rest) {
                if let Ok(call) = serde_json::from_str::<ToolCall>(&rest[..=end]) {
                    return Some(call);
                }
            }
        }
    }

    None
}

/// Byte index of the brace closing the object that starts at byte 0.
///
/// String-aware so braces inside JSON string values don't confuse it.
fn find_matching_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

/// Truncate for log output, respecting char boundaries.
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}
