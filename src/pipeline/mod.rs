//! Research pipeline
//!
//! Tasks are declared in order and run one after another. A task may take the
//! outputs of earlier tasks as context; the last task's output is the run's
//! result and is usually written to a file.
//!
//! - [`graph`] validates the task list
//! - [`template`] renders `{topic}` placeholders
//! - [`log`] captures the per-run trace
//! - [`runner`] executes a run and tracks its state

pub mod graph;
pub mod log;
pub mod runner;
pub mod task;
pub mod template;

pub use graph::{GraphError, TaskGraph};
pub use log::{LogEntry, LogKind, RunLog};
pub use runner::{PipelineRunner, RunRecord, RunState};
pub use task::{TaskOutput, TaskSpec};
pub use template::{render, topic_inputs, TemplateInputs};
