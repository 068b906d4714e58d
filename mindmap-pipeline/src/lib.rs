//! Concrete mindmap pipelines.
//!
//! Wires the runtime primitives from `mindmap-agent` into the workflows
//! the CLI exposes:
//! - [`planner`]: draft → critique/refine loop → presented plan
//! - [`executor`]: checklist execution loop → summary → clean answer
//! - [`orchestrator`]: planner → debug stage → executor
//! - [`analysis`]: host-driven TODO analysis over single documents
//!
//! Pipelines are built per session because the loop-exit tool binds to the
//! session's completion flag.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod analysis;
pub mod executor;
pub mod orchestrator;
pub mod planner;

use mindmap_agent::Provider;
use mindmap_common::config::{LlmConfig, PipelineConfig};
use mindmap_store::DocumentStore;
use std::sync::Arc;

/// Shared ingredients for building pipelines.
#[derive(Clone)]
pub struct PipelineContext {
    pub provider: Arc<dyn Provider>,
    pub store: DocumentStore,
    pub model: String,
    pub temperature: f64,
    pub refinement_iterations: usize,
    pub execution_iterations: usize,
}

impl PipelineContext {
    pub fn new(
        provider: Arc<dyn Provider>,
        store: DocumentStore,
        llm: &LlmConfig,
        pipeline: &PipelineConfig,
    ) -> Self {
        Self {
            provider,
            store,
            model: llm.model.clone(),
            temperature: llm.temperature,
            refinement_iterations: pipeline.refinement_iterations,
            execution_iterations: pipeline.execution_iterations,
        }
    }
}
