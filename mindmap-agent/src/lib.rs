//! Agent runtime for the mindmap workspace.
//!
//! Building blocks used by the concrete pipelines:
//! - [`provider`]: the LLM backend trait and the Ollama implementation
//! - [`session`]: shared session state passed between pipeline stages
//! - [`tool`]: the tool trait agents use to act on the world
//! - [`tools`]: document-store tools and the loop-exit tool
//! - [`llm_agent`]: a prompt-driven agent with a bounded tool-call loop
//! - [`compose`]: sequential and loop composition of agents
//!
//! The loop construct terminates on a shared completion flag set by any
//! participant (in practice, the `exit_loop` tool), checked after every
//! participant so an exit takes effect immediately.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod compose;
pub mod llm_agent;
pub mod provider;
pub mod session;
pub mod tool;
pub mod tools;

pub use compose::{Agent, LoopAgent, SequentialAgent, COMPLETION_PHRASE};
pub use llm_agent::LlmAgent;
pub use provider::{OllamaProvider, Provider};
pub use session::{keys, SessionState};
pub use tool::{Tool, ToolResult, ToolSpec};
pub use tools::{exit_loop_tool, store_tools};
