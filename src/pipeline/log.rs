//! Per-run trace
//!
//! A [`RunLog`] is created for every run and handed to each agent. It is the
//! text shown in the "Agent Thoughts and Process" panel. Every entry is also
//! emitted as a `tracing` event so the server log carries the same trace.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    /// A task started or finished
    Task,
    /// Intermediate model text that accompanies tool calls
    Thought,
    ToolCall,
    ToolResult,
    ToolError,
    /// Final answer of an agent
    Answer,
    /// A step that aborted the run
    Error,
}

impl LogKind {
    pub fn label(&self) -> &'static str {
        match self {
            LogKind::Task => "Task",
            LogKind::Thought => "Thought",
            LogKind::ToolCall => "Using tool",
            LogKind::ToolResult => "Tool output",
            LogKind::ToolError => "Tool error",
            LogKind::Answer => "Final Answer",
            LogKind::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    /// `runner` or the role of the agent that wrote the entry
    pub source: String,
    pub kind: LogKind,
    pub message: String,
}

/// Shared, append-only log sink for one run
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, source: &str, kind: LogKind, message: impl Into<String>) {
        let entry = LogEntry {
            timestamp: Utc::now(),
            source: source.to_string(),
            kind,
            message: message.into(),
        };

        match kind {
            LogKind::Task | LogKind::Answer => {
                tracing::info!(source = %entry.source, kind = kind.label(), "{}", preview(&entry.message))
            }
            LogKind::ToolError | LogKind::Error => {
                tracing::warn!(source = %entry.source, kind = kind.label(), "{}", preview(&entry.message))
            }
            _ => tracing::debug!(source = %entry.source, kind = kind.label(), "{}", preview(&entry.message)),
        }

        self.entries.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Render the whole trace as plain text
    pub fn render(&self) -> String {
        let entries = self.entries.lock();
        let mut out = String::new();

        for entry in entries.iter() {
            let _ = writeln!(
                out,
                "[{}] [{}] {}: {}",
                entry.timestamp.format("%H:%M:%S"),
                entry.source,
                entry.kind.label(),
                entry.message.trim_end()
            );
        }

        out
    }
}

// Tracing events carry a shortened message; the full text stays in the log.
fn preview(message: &str) -> &str {
    const MAX: usize = 200;
    match message.char_indices().nth(MAX) {
        Some((idx, _)) => &message[..idx],
        None => message,
    }
}
