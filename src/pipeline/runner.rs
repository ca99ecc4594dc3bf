//! Pipeline Runner
//!
//! Executes the task graph for one topic. State moves
//! `Idle -> Running(i) -> Completed | Failed`; terminal states stay visible
//! until the next run starts. Only one run may hold the pipeline at a time.

use crate::agents::{AgentRegistry, TaskRequest};
use crate::llm::LLMClient;
use crate::pipeline::{topic_inputs, render, LogKind, RunLog, TaskGraph, TaskOutput, TaskSpec, TemplateInputs};
use crate::tools::registry::ToolRegistry;
use crate::types::{AppError, Result};
use crate::utils::toml_config::NotecrewConfig;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

const RUNNER: &str = "runner";

/// Observable state of the runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running { task_index: usize, task: String },
    Completed { run_id: Uuid, topic: String },
    Failed { task: String, error: String },
}

/// Everything produced by one successful run
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub topic: String,
    pub task_outputs: Vec<TaskOutput>,
    /// The rendered run log
    pub log: String,
    /// Output of the last task
    pub final_markdown: String,
    /// Where the final output was written, if the last task has an output file
    pub output_file: Option<PathBuf>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunRecord {
    pub fn duration_ms(&self) -> u64 {
        (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64
    }
}

pub struct PipelineRunner {
    graph: TaskGraph,
    agents: AgentRegistry,
    output_dir: PathBuf,
    run_lock: Mutex<()>,
    state: RwLock<RunState>,
}

impl PipelineRunner {
    /// Create a runner. Every task's agent must be registered.
    pub fn new(graph: TaskGraph, agents: AgentRegistry, output_dir: impl Into<PathBuf>) -> Result<Self> {
        for task in graph.tasks() {
            if !agents.has_agent(&task.agent) {
                return Err(AppError::Configuration(format!(
                    "Agent '{}' referenced by task '{}' does not exist",
                    task.agent, task.name
                )));
            }
        }

        Ok(Self {
            graph,
            agents,
            output_dir: output_dir.into(),
            run_lock: Mutex::new(()),
            state: RwLock::new(RunState::Idle),
        })
    }

    /// Wire the runner from configuration with the given LLM client and tools
    pub fn from_config(
        config: &NotecrewConfig,
        llm: Arc<dyn LLMClient>,
        tools: Arc<ToolRegistry>,
    ) -> Result<Self> {
        let graph = config
            .task_graph()
            .map_err(|e| AppError::Configuration(e.to_string()))?;
        let agents = AgentRegistry::from_config(config, llm, tools)?;
        Self::new(graph, agents, config.output.dir.clone())
    }

    pub fn state(&self) -> RunState {
        self.state.read().clone()
    }

    pub fn tasks(&self) -> &[TaskSpec] {
        self.graph.tasks()
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.state.read(), RunState::Running { .. })
    }

    /// File written by the last task, if it declares one
    pub fn final_output_file(&self) -> Option<PathBuf> {
        self.graph
            .last()
            .output_file
            .as_deref()
            .map(|file| self.output_dir.join(file))
    }

    fn set_state(&self, state: RunState) {
        *self.state.write() = state;
    }

    /// Run every task for `topic` in order.
    ///
    /// # Errors
    ///
    /// - [`AppError::MissingTopic`] for an empty topic; nothing runs
    /// - [`AppError::RunInProgress`] while another run holds the pipeline
    /// - [`AppError::TaskFailed`] when a task fails; later tasks do not run
    pub async fn run(&self, topic: &str) -> Result<RunRecord> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(AppError::MissingTopic);
        }

        let _guard = self.run_lock.try_lock().map_err(|_| AppError::RunInProgress)?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let log = RunLog::new();
        let inputs = topic_inputs(topic);

        info!(%run_id, topic, tasks = self.graph.len(), "Research run started");
        log.record(
            RUNNER,
            LogKind::Task,
            format!("Starting research on '{}' with {} tasks", topic, self.graph.len()),
        );

        let mut task_outputs: Vec<TaskOutput> = Vec::with_capacity(self.graph.len());
        let mut outputs_by_task: HashMap<String, String> = HashMap::new();
        let mut output_file = None;

        for (index, task) in self.graph.tasks().iter().enumerate() {
            self.set_state(RunState::Running {
                task_index: index,
                task: task.name.clone(),
            });
            log.record(
                RUNNER,
                LogKind::Task,
                format!("[{}/{}] {} ({})", index + 1, self.graph.len(), task.name, task.agent),
            );

            match self.run_task(task, &inputs, &outputs_by_task, &log).await {
                Ok((output, written)) => {
                    if written.is_some() {
                        output_file = written;
                    }
                    outputs_by_task.insert(task.name.clone(), output.output.clone());
                    task_outputs.push(output);
                }
                Err(e) => {
                    error!(%run_id, task = %task.name, error = %e, "Research run failed");
                    log.record(RUNNER, LogKind::Error, format!("Task '{}' failed: {}", task.name, e));
                    self.set_state(RunState::Failed {
                        task: task.name.clone(),
                        error: e.to_string(),
                    });
                    return Err(AppError::TaskFailed {
                        task: task.name.clone(),
                        source: Box::new(e),
                        log: log.render(),
                    });
                }
            }
        }

        let final_markdown = task_outputs
            .last()
            .map(|o| o.output.clone())
            .unwrap_or_default();

        log.record(RUNNER, LogKind::Task, "Research complete!");
        let finished_at = Utc::now();

        let record = RunRecord {
            run_id,
            topic: topic.to_string(),
            task_outputs,
            log: log.render(),
            final_markdown,
            output_file,
            started_at,
            finished_at,
        };

        info!(%run_id, duration_ms = record.duration_ms(), "Research run completed");
        self.set_state(RunState::Completed {
            run_id,
            topic: record.topic.clone(),
        });

        Ok(record)
    }

    /// Run on a separate task so the run finishes even if the caller goes away
    /// (for example a browser tab closed mid-run).
    pub async fn run_detached(self: &Arc<Self>, topic: String) -> Result<RunRecord> {
        let runner = Arc::clone(self);
        match tokio::spawn(async move { runner.run(&topic).await }).await {
            Ok(result) => result,
            Err(e) => {
                // A panicking task never reaches its own failure branch
                let task = match self.state() {
                    RunState::Running { task, .. } => task,
                    _ => RUNNER.to_string(),
                };
                error!(task = %task, error = %e, "Research run aborted");
                self.set_state(RunState::Failed {
                    task,
                    error: format!("Research run aborted: {}", e),
                });
                Err(AppError::Internal(format!("Research run aborted: {}", e)))
            }
        }
    }

    async fn run_task(
        &self,
        task: &TaskSpec,
        inputs: &TemplateInputs,
        outputs_by_task: &HashMap<String, String>,
        log: &RunLog,
    ) -> Result<(TaskOutput, Option<PathBuf>)> {
        let agent = self.agents.get(&task.agent).ok_or_else(|| {
            AppError::Configuration(format!("Agent '{}' is not registered", task.agent))
        })?;

        let mut context = Vec::with_capacity(task.context.len());
        for upstream in &task.context {
            let output = outputs_by_task.get(upstream).ok_or_else(|| {
                AppError::Internal(format!(
                    "Context '{}' for task '{}' has not been produced",
                    upstream, task.name
                ))
            })?;
            context.push((upstream.clone(), output.clone()));
        }

        let request = TaskRequest {
            task: task.name.clone(),
            description: render(&task.description, inputs),
            expected_output: render(&task.expected_output, inputs),
            inputs: inputs.clone(),
            context,
        };

        let start = Instant::now();
        let output = agent.run(&request, log).await?;
        let duration_ms = start.elapsed().as_millis() as u64;

        let written = match &task.output_file {
            Some(file) => {
                let path = self.output_dir.join(file);
                write_output(&path, &output).await?;
                log.record(RUNNER, LogKind::Task, format!("Wrote {}", path.display()));
                Some(path)
            }
            None => None,
        };

        Ok((
            TaskOutput {
                task: task.name.clone(),
                agent: task.agent.clone(),
                role: agent.role().to_string(),
                output,
                duration_ms,
            },
            written,
        ))
    }
}

async fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::Internal(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
    }

    tokio::fs::write(path, content.as_bytes())
        .await
        .map_err(|e| AppError::Internal(format!("Failed to write {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::Agent;
    use async_trait::async_trait;

    struct FixedAgent {
        role: String,
        fail: bool,
    }

    #[async_trait]
    impl Agent for FixedAgent {
        fn role(&self) -> &str {
            &self.role
        }

        async fn run(&self, request: &TaskRequest, log: &RunLog) -> Result<String> {
            log.record(&self.role, LogKind::Answer, "done");
            if self.fail {
                return Err(AppError::UnreachableEndpoint("connection refused".to_string()));
            }
            Ok(format!("{} output ({} context)", request.task, request.context.len()))
        }
    }

    struct PanickingAgent;

    #[async_trait]
    impl Agent for PanickingAgent {
        fn role(&self) -> &str {
            "P"
        }

        async fn run(&self, request: &TaskRequest, _log: &RunLog) -> Result<String> {
            if !request.task.is_empty() {
                panic!("agent crashed on {}", request.task);
            }
            Ok(String::new())
        }
    }

    fn runner(dir: &Path, fail_second: bool) -> PipelineRunner {
        let graph = TaskGraph::new(vec![
            TaskSpec::new("first", "a", "First on {topic}", "x"),
            TaskSpec::new("second", "b", "Second on {topic}", "y")
                .with_context(["first"])
                .with_output_file("nested/notes.md"),
        ])
        .unwrap();

        let mut agents = AgentRegistry::new();
        agents.register("a", Arc::new(FixedAgent { role: "A".into(), fail: false }));
        agents.register("b", Arc::new(FixedAgent { role: "B".into(), fail: fail_second }));

        PipelineRunner::new(graph, agents, dir).unwrap()
    }

    #[tokio::test]
    async fn test_empty_topic_keeps_idle() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path(), false);

        assert!(matches!(runner.run("   ").await, Err(AppError::MissingTopic)));
        assert_eq!(runner.state(), RunState::Idle);
    }

    #[tokio::test]
    async fn test_completed_run_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path(), false);

        let record = runner.run("qubits").await.unwrap();
        assert_eq!(record.task_outputs.len(), 2);
        assert_eq!(record.final_markdown, "second output (1 context)");

        let path = record.output_file.clone().unwrap();
        assert_eq!(path, dir.path().join("nested/notes.md"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), record.final_markdown);
        assert_eq!(runner.final_output_file(), Some(path));
        assert!(matches!(runner.state(), RunState::Completed { .. }));
    }

    #[tokio::test]
    async fn test_failed_run_reports_task_and_log() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path(), true);

        match runner.run("qubits").await {
            Err(AppError::TaskFailed { task, source, log }) => {
                assert_eq!(task, "second");
                assert!(matches!(*source, AppError::UnreachableEndpoint(_)));
                assert!(log.contains("[A] Final Answer: done"));
            }
            other => panic!("expected TaskFailed, got {other:?}"),
        }

        assert!(matches!(runner.state(), RunState::Failed { ref task, .. } if task == "second"));
        assert!(!dir.path().join("nested/notes.md").exists());
    }

    #[tokio::test]
    async fn test_panicking_task_marks_run_failed() {
        let dir = tempfile::tempdir().unwrap();
        let graph = TaskGraph::new(vec![TaskSpec::new("crash", "p", "Crash on {topic}", "x")]).unwrap();
        let mut agents = AgentRegistry::new();
        agents.register("p", Arc::new(PanickingAgent));
        let runner = Arc::new(PipelineRunner::new(graph, agents, dir.path()).unwrap());

        let result = runner.run_detached("qubits".to_string()).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
        assert!(matches!(runner.state(), RunState::Failed { ref task, .. } if task == "crash"));
        assert!(!runner.is_running());

        // The run lock was released, so the next run is accepted
        assert!(!matches!(
            runner.run_detached("qubits".to_string()).await,
            Err(AppError::RunInProgress)
        ));
    }

    #[test]
    fn test_missing_agent_rejected() {
        let graph = TaskGraph::new(vec![TaskSpec::new("only", "ghost", "d", "e")]).unwrap();
        let result = PipelineRunner::new(graph, AgentRegistry::new(), ".");
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_state_serializes_with_status_tag() {
        let value = serde_json::to_value(RunState::Running {
            task_index: 2,
            task: "summarize".to_string(),
        })
        .unwrap();
        assert_eq!(value["status"], "running");
        assert_eq!(value["task_index"], 2);
    }
}
