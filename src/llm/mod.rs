//! LLM Client Binding
//!
//! A single trait, [`LLMClient`], hides the inference server from the agents.
//! The shipped backend is [`openai::OpenAIClient`], which speaks the
//! OpenAI-compatible chat completions protocol that local servers such as
//! Ollama (`http://localhost:11434/v1`) expose.
//!
//! # Example
//!
//! ```ignore
//! use notecrew::llm::{create_client, LLMClient};
//!
//! let client = create_client(&config.llm, "NA".to_string())?;
//! let text = client
//!     .generate_with_system("You are a Researcher.", "List three facts about qubits.")
//!     .await?;
//! ```
//!
//! # Errors
//!
//! - [`AppError::UnreachableEndpoint`](crate::types::AppError::UnreachableEndpoint)
//!   when the server cannot be reached
//! - [`AppError::MalformedResponse`](crate::types::AppError::MalformedResponse)
//!   when the payload cannot be read as a completion
//!
//! No retry policy is applied here.

/// Core LLM client trait and message types.
pub mod client;
/// OpenAI-compatible HTTP backend.
pub mod openai;

pub use client::{create_client, ChatMessage, LLMClient, LLMResponse, Role};
