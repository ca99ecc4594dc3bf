//! # notecrew
//!
//! A research note-taking crew. Five LLM agents run one after another over a
//! topic (research, fact check, summarize, organize, take notes) and the
//! result is shown on a single web page and written to `notes.md`.
//!
//! ## Overview
//!
//! notecrew can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `notecrew-server` binary
//! 2. **As a library** - Build a [`PipelineRunner`] and call it directly
//!
//! ### Library Example
//!
//! ```rust,ignore
//! use notecrew::{llm, NotecrewConfig, PipelineRunner, ToolRegistry};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = NotecrewConfig::builtin()?;
//!     let llm = llm::create_client(&config.llm, config.llm_api_key()?)?;
//!     let tools = Arc::new(ToolRegistry::from_config(&config)?);
//!     let runner = PipelineRunner::from_config(&config, llm, tools)?;
//!
//!     let record = runner.run("Rust async runtimes").await?;
//!     println!("{}", record.final_markdown);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`agents`] - LLM agents with role, goal, backstory and tools
//! - [`api`] - HTTP handlers and routes
//! - [`cli`] - Command-line interface
//! - [`llm`] - OpenAI-compatible chat completion client
//! - [`pipeline`] - Task graph, run log and the sequential runner
//! - [`tools`] - Web search and website scraping
//! - [`types`] - Common types and error handling
//! - [`utils`] - TOML configuration
//! - [`web`] - Server-rendered research page

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// Agents driven by an LLM and a tool set.
pub mod agents;
/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface.
pub mod cli;
/// LLM client abstraction and the OpenAI-compatible client.
pub mod llm;
/// Sequential task pipeline.
pub mod pipeline;
/// Built-in tools (web search, website scraping).
pub mod tools;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;
/// HTML rendering for the research page.
pub mod web;

// Re-export commonly used types
pub use agents::{Agent, AgentRegistry, ConfigurableAgent};
pub use llm::{LLMClient, LLMResponse};
pub use pipeline::{PipelineRunner, RunRecord, RunState, TaskGraph, TaskOutput, TaskSpec};
pub use tools::registry::ToolRegistry;
pub use types::{AppError, Result};
pub use utils::toml_config::NotecrewConfig;

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<NotecrewConfig>,
    /// The single pipeline runner; at most one run at a time
    pub runner: Arc<PipelineRunner>,
}

impl AppState {
    /// Wrap a config and a runner built from it
    pub fn new(config: NotecrewConfig, runner: PipelineRunner) -> Self {
        Self {
            config: Arc::new(config),
            runner: Arc::new(runner),
        }
    }
}
