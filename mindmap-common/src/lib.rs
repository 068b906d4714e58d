//! Shared foundation for the mindmap agent workspace.
//!
//! Provides the three ambient concerns every other crate leans on:
//! - [`config`]: unified JSON configuration with env overrides
//! - [`logging`]: structured tracing setup with noise filtering
//! - [`error`]: the workspace-wide error type

pub mod config;
pub mod error;
pub mod logging;

pub use config::Config;
pub use error::{Error, Result};
