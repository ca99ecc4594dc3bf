pub mod configurable;
pub mod registry;

use crate::pipeline::{RunLog, TemplateInputs};
use crate::types::Result;
use async_trait::async_trait;
use std::fmt::Write as _;

// Re-export commonly used types
pub use configurable::ConfigurableAgent;
pub use registry::AgentRegistry;

/// Everything an agent needs to perform one task
#[derive(Debug, Clone, Default)]
pub struct TaskRequest {
    /// Task name, e.g. `research`
    pub task: String,
    /// Rendered task description
    pub description: String,
    /// Rendered expected-output criteria
    pub expected_output: String,
    /// Inputs used to render the agent's own templates
    pub inputs: TemplateInputs,
    /// Outputs of the upstream context tasks as `(task, output)`, in order
    pub context: Vec<(String, String)>,
}

impl TaskRequest {
    /// The user message handed to the model
    pub fn prompt(&self) -> String {
        let mut prompt = String::new();
        let _ = writeln!(prompt, "Current Task: {}", self.description.trim());
        let _ = write!(
            prompt,
            "\nThis is the expected criteria for your final answer: {}\n\
             You MUST return the actual complete content as the final answer, not a summary.\n",
            self.expected_output.trim()
        );

        if !self.context.is_empty() {
            prompt.push_str("\nThis is the context you're working with:\n");
            for (task, output) in &self.context {
                let _ = write!(prompt, "\n## Output of task '{}'\n{}\n", task, output.trim());
            }
        }

        prompt.push_str("\nBegin! This is VERY important to you, use the tools available and give your best Final Answer, your job depends on it!");
        prompt
    }
}

/// Base trait for all agents
#[async_trait]
pub trait Agent: Send + Sync {
    /// Persona role shown in the run log, e.g. "Researcher"
    fn role(&self) -> &str;

    /// Whether the agent may hand work to other agents
    fn allows_delegation(&self) -> bool {
        false
    }

    /// Perform one task and return the final answer.
    ///
    /// Intermediate steps are written to `log`.
    async fn run(&self, request: &TaskRequest, log: &RunLog) -> Result<String>;
}
