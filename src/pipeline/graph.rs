//! Task graph validation
//!
//! Tasks run in declaration order. Each task may only take context from tasks
//! declared before it, which makes the list a topological order of its own
//! dependency graph. Violations are rejected when the graph is built.

use crate::pipeline::TaskSpec;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("the pipeline has no tasks")]
    Empty,

    #[error("task '{0}' is declared more than once")]
    DuplicateTask(String),

    #[error("task '{task}' lists unknown context task '{context}'")]
    UnknownContext { task: String, context: String },

    #[error("task '{task}' takes context from '{context}', which runs after it")]
    ForwardReference { task: String, context: String },

    #[error("context cycle: {}", .0.join(" -> "))]
    Cycle(Vec<String>),
}

/// An ordered, validated list of tasks
#[derive(Debug, Clone)]
pub struct TaskGraph {
    tasks: Vec<TaskSpec>,
}

impl TaskGraph {
    pub fn new(tasks: Vec<TaskSpec>) -> Result<Self, GraphError> {
        if tasks.is_empty() {
            return Err(GraphError::Empty);
        }

        let mut positions: HashMap<&str, usize> = HashMap::new();
        for (index, task) in tasks.iter().enumerate() {
            if positions.insert(task.name.as_str(), index).is_some() {
                return Err(GraphError::DuplicateTask(task.name.clone()));
            }
        }

        for task in &tasks {
            for context in &task.context {
                if !positions.contains_key(context.as_str()) {
                    return Err(GraphError::UnknownContext {
                        task: task.name.clone(),
                        context: context.clone(),
                    });
                }
            }
        }

        let dependencies: HashMap<String, Vec<&str>> = tasks
            .iter()
            .map(|t| (t.name.clone(), t.context.iter().map(String::as_str).collect()))
            .collect();
        if let Some(cycle) = detect_cycle(&tasks, &dependencies) {
            return Err(GraphError::Cycle(cycle));
        }

        for (index, task) in tasks.iter().enumerate() {
            for context in &task.context {
                if positions[context.as_str()] > index {
                    return Err(GraphError::ForwardReference {
                        task: task.name.clone(),
                        context: context.clone(),
                    });
                }
            }
        }

        Ok(Self { tasks })
    }

    pub fn tasks(&self) -> &[TaskSpec] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&TaskSpec> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// The task whose output is the pipeline result
    pub fn last(&self) -> &TaskSpec {
        // Non-empty by construction
        &self.tasks[self.tasks.len() - 1]
    }
}

/// Returns the first cycle found, as a path ending in the repeated node
fn detect_cycle(tasks: &[TaskSpec], dependencies: &HashMap<String, Vec<&str>>) -> Option<Vec<String>> {
    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut path = Vec::new();

    // Declaration order keeps the reported cycle deterministic
    for task in tasks {
        if dfs_cycle(&task.name, dependencies, &mut visited, &mut rec_stack, &mut path) {
            return Some(path);
        }
    }

    None
}

fn dfs_cycle(
    node: &str,
    graph: &HashMap<String, Vec<&str>>,
    visited: &mut HashSet<String>,
    rec_stack: &mut HashSet<String>,
    path: &mut Vec<String>,
) -> bool {
    if rec_stack.contains(node) {
        path.push(node.to_string());
        return true;
    }

    if visited.contains(node) {
        return false;
    }

    visited.insert(node.to_string());
    rec_stack.insert(node.to_string());
    path.push(node.to_string());

    if let Some(deps) = graph.get(node) {
        for dep in deps {
            if dfs_cycle(dep, graph, visited, rec_stack, path) {
                return true;
            }
        }
    }

    rec_stack.remove(node);
    path.pop();
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(name: &str, context: &[&str]) -> TaskSpec {
        TaskSpec::new(name, "agent", "do {topic}", "done").with_context(context.iter().copied())
    }

    #[test]
    fn accepts_research_pipeline() {
        let graph = TaskGraph::new(vec![
            task("research", &[]),
            task("fact_check", &["research"]),
            task("summarize", &["research", "fact_check"]),
            task("organize", &["fact_check", "summarize"]),
            task("take_notes", &["research", "fact_check", "organize"]),
        ])
        .unwrap();

        assert_eq!(graph.len(), 5);
        assert_eq!(graph.last().name, "take_notes");
        assert!(graph.get("organize").is_some());
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(TaskGraph::new(vec![]).unwrap_err(), GraphError::Empty);
    }

    #[test]
    fn rejects_duplicates() {
        let err = TaskGraph::new(vec![task("a", &[]), task("a", &[])]).unwrap_err();
        assert_eq!(err, GraphError::DuplicateTask("a".to_string()));
    }

    #[test]
    fn rejects_unknown_context() {
        let err = TaskGraph::new(vec![task("a", &["ghost"])]).unwrap_err();
        assert!(matches!(err, GraphError::UnknownContext { .. }));
    }

    #[test]
    fn rejects_forward_reference() {
        let err = TaskGraph::new(vec![task("a", &["b"]), task("b", &[])]).unwrap_err();
        assert_eq!(
            err,
            GraphError::ForwardReference {
                task: "a".to_string(),
                context: "b".to_string()
            }
        );
    }

    #[test]
    fn rejects_self_cycle() {
        let err = TaskGraph::new(vec![task("a", &["a"])]).unwrap_err();
        assert_eq!(err, GraphError::Cycle(vec!["a".to_string(), "a".to_string()]));
    }

    #[test]
    fn rejects_longer_cycle() {
        let err = TaskGraph::new(vec![
            task("a", &["c"]),
            task("b", &["a"]),
            task("c", &["b"]),
        ])
        .unwrap_err();

        match err {
            GraphError::Cycle(path) => {
                assert_eq!(path.first(), Some(&"a".to_string()));
                assert_eq!(path.last(), Some(&"a".to_string()));
                assert!(err_message_mentions(&path, "b"));
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    fn err_message_mentions(path: &[String], name: &str) -> bool {
        GraphError::Cycle(path.to_vec()).to_string().contains(name)
    }
}
