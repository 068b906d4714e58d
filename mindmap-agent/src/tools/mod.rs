//! Built-in tools: document-store queries and the loop-exit signal.

mod exit_loop;
mod store_tools;

pub use exit_loop::{exit_loop_tool, ExitLoopTool};
pub use store_tools::store_tools;
