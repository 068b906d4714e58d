//! Mindmap CLI - Main entry point.

#![warn(clippy::all)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mindmap_agent::{keys, Agent, OllamaProvider, Provider, SessionState};
use mindmap_common::config::Config;
use mindmap_common::logging::init_logging;
use mindmap_pipeline::analysis::AnalysisPipeline;
use mindmap_pipeline::executor::build_executor;
use mindmap_pipeline::orchestrator::build_orchestrator;
use mindmap_pipeline::planner::build_planner;
use mindmap_pipeline::PipelineContext;
use mindmap_store::{import_dir, DocumentStore};

/// Agentic Q&A and analysis over a mindmap document base.
#[derive(Parser, Debug)]
#[command(name = "mindmap")]
#[command(version = "0.1.0")]
#[command(about = "Plan, execute, and analyse against a mindmap document base.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import a mindmap directory (one subdirectory per module, .md files inside)
    Import {
        /// Directory to scan
        dir: PathBuf,
    },
    /// List all modules
    Modules,
    /// List file names within a module
    Files {
        /// Module name
        module: String,
    },
    /// Print a document's content
    Show {
        /// Document file name (without extension)
        file_name: String,
    },
    /// Rank documents against a query
    Search {
        /// Query text
        query: String,
        /// Maximum results to return
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Draft and refine a work plan for a request
    Plan {
        /// The request to plan for
        query: String,
    },
    /// Run the full plan-then-execute workflow for a request
    Run {
        /// The request to handle
        query: String,
    },
    /// Analyse which documents are relevant to a requirement
    Analyse {
        /// The requirement to analyse
        query: String,
    },
    /// Check configuration, database, and model connectivity
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;
    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );
    tracing::debug!(db_path = %config.store.db_path.display(), "Configuration loaded");

    let store = DocumentStore::open(&config.store.db_path)?;

    match cli.command {
        Commands::Import { dir } => {
            let summary = import_dir(&store, &dir).await?;
            println!(
                "Imported {} rows ({} documents, {} empty modules) across {} modules.",
                summary.total,
                summary.with_content,
                summary.empty_modules,
                summary.modules.len()
            );
            Ok(())
        }
        Commands::Modules => {
            for module in store.modules().await? {
                println!("{module}");
            }
            Ok(())
        }
        Commands::Files { module } => {
            let files = store.files_by_module(&module).await?;
            if files.is_empty() {
                println!("No files found in module '{module}'.");
            }
            for file in files {
                println!("{file}");
            }
            Ok(())
        }
        Commands::Show { file_name } => match store.content_by_file_name(&file_name).await? {
            Some(content) => {
                println!("{content}");
                Ok(())
            }
            None => anyhow::bail!("document '{file_name}' not found"),
        },
        Commands::Search { query, limit } => {
            let hits = store.search(&query, limit).await?;
            if hits.is_empty() {
                println!("No matching documents.");
            }
            for (file_name, score) in hits {
                println!("{score:8.4}  {file_name}");
            }
            Ok(())
        }
        Commands::Plan { query } => {
            let ctx = pipeline_context(&config, store)?;
            let session = SessionState::with_query(&query);
            build_planner(&ctx, &session).run(&session).await?;
            print_key(&session, keys::FINAL_OUTPUT, "The planner produced no output.").await;
            Ok(())
        }
        Commands::Run { query } => {
            let ctx = pipeline_context(&config, store)?;
            let session = SessionState::with_query(&query);
            build_orchestrator(&ctx, &session).run(&session).await?;
            print_key(&session, keys::CLEAN_OUTPUT, "The workflow produced no answer.").await;
            Ok(())
        }
        Commands::Analyse { query } => {
            let ctx = pipeline_context(&config, store)?;
            let report = AnalysisPipeline::new(ctx).run(&query).await?;
            if report.todos.is_empty() {
                println!("No documents were selected for review.");
                return Ok(());
            }
            println!("{}", report.report);
            println!();
            println!(
                "Reviewed {} documents, {} targets.",
                report.results.len(),
                report.target_files.len()
            );
            Ok(())
        }
        Commands::Doctor => doctor(&config, &store).await,
    }
}

fn pipeline_context(config: &Config, store: DocumentStore) -> Result<PipelineContext> {
    let provider = OllamaProvider::new(&config.llm.base_url, config.llm.timeout_secs)?;
    Ok(PipelineContext::new(
        Arc::new(provider),
        store,
        &config.llm,
        &config.pipeline,
    ))
}

/// Print a session key's text, or a fallback line when the key is empty.
async fn print_key(session: &SessionState, key: &str, fallback: &str) {
    match session.get_text(key).await {
        Some(text) if !text.trim().is_empty() => println!("{text}"),
        _ => println!("{fallback}"),
    }
}

/// Health checks for config, database, and the model endpoint.
async fn doctor(config: &Config, store: &DocumentStore) -> Result<()> {
    println!("Config");
    println!("  database:  {}", config.store.db_path.display());
    println!("  ollama:    {}", config.llm.base_url);
    println!("  model:     {}", config.llm.model);

    let summary = store.summary().await?;
    println!("Store");
    println!(
        "  {} rows ({} documents, {} empty modules), {} modules",
        summary.total,
        summary.with_content,
        summary.empty_modules,
        summary.modules.len()
    );

    println!("Model");
    let provider = OllamaProvider::new(&config.llm.base_url, config.llm.timeout_secs)?;
    match provider.warmup().await {
        Ok(()) => println!("  Ollama is reachable at {}", config.llm.base_url),
        Err(e) => println!("  Ollama is NOT reachable: {e}"),
    }
    Ok(())
}
