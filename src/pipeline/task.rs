use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A task definition as declared under `[[tasks]]`.
///
/// `description` and `expected_output` are templates rendered with the run's
/// inputs before the agent sees them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,

    /// Name of the agent in `[agents.<name>]` that performs this task
    pub agent: String,

    pub description: String,

    pub expected_output: String,

    /// Upstream tasks whose outputs are handed to this task, in order
    #[serde(default)]
    pub context: Vec<String>,

    /// File the output is written to, relative to `[output].dir`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
}

impl TaskSpec {
    pub fn new(
        name: impl Into<String>,
        agent: impl Into<String>,
        description: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            agent: agent.into(),
            description: description.into(),
            expected_output: expected_output.into(),
            context: Vec::new(),
            output_file: None,
        }
    }

    pub fn with_context<I, S>(mut self, context: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context = context.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_output_file(mut self, file: impl Into<String>) -> Self {
        self.output_file = Some(file.into());
        self
    }
}

/// Result of one task within a run
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskOutput {
    /// Task name
    pub task: String,
    /// Name of the agent that produced the output
    pub agent: String,
    /// Role of that agent
    pub role: String,
    /// The agent's final answer
    pub output: String,
    /// Duration of this task in milliseconds
    pub duration_ms: u64,
}
