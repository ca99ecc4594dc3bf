//! Tool Adapters for Agent Capabilities
//!
//! Tools let agents reach beyond text generation. Two are shipped:
//!
//! - [`search`](crate::tools::search) - `web_search`, ranked web results
//!   from Serper or DuckDuckGo
//! - [`scrape`](crate::tools::scrape) - `scrape_website`, readable text of
//!   a single page
//!
//! # Tool Registry
//!
//! The [`registry`](crate::tools::registry) module holds the tools by name.
//! Agents only receive definitions for the tools they are permitted to use:
//!
//! ```ignore
//! let registry = ToolRegistry::from_config(&config)?;
//! let defs = registry.get_tool_definitions_for(&["web_search"]);
//! let value = registry.execute("web_search", json!({"query": "qubits"})).await?;
//! ```
//!
//! A failing tool returns an error to the calling agent, which reports it to
//! the model and keeps going. Tool errors never abort a run on their own.

/// Tool trait and registry.
pub mod registry;
/// Web page scraping.
pub mod scrape;
/// Web search.
pub mod search;

pub use registry::{Tool, ToolRegistry};
