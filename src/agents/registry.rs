//! Agent Registry
//!
//! Builds one [`ConfigurableAgent`] per `[agents.<name>]` entry. All agents
//! share the LLM client and the tool registry; each only sees the tools it
//! lists.

use crate::agents::configurable::ConfigurableAgent;
use crate::agents::Agent;
use crate::llm::LLMClient;
use crate::tools::registry::ToolRegistry;
use crate::types::Result;
use crate::utils::toml_config::NotecrewConfig;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Registry of ready-to-run agents keyed by name
#[derive(Default)]
pub struct AgentRegistry {
    agents: BTreeMap<String, Arc<dyn Agent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an agent for every configured persona
    pub fn from_config(
        config: &NotecrewConfig,
        llm: Arc<dyn LLMClient>,
        tool_registry: Arc<ToolRegistry>,
    ) -> Result<Self> {
        let mut registry = Self::new();

        for (name, agent_config) in &config.agents {
            let agent = ConfigurableAgent::new(
                name,
                agent_config,
                llm.clone(),
                Some(tool_registry.clone()),
            )?;
            tracing::debug!(
                agent = agent.name(),
                max_iterations = agent.max_iterations(),
                tools = ?agent.allowed_tools(),
                "Agent configured"
            );
            registry.register(name, Arc::new(agent));
        }

        tracing::debug!(agents = ?registry.agent_names(), "Agent registry ready");
        Ok(registry)
    }

    /// Register an agent, replacing any agent of the same name
    pub fn register(&mut self, name: &str, agent: Arc<dyn Agent>) {
        self.agents.insert(name.to_string(), agent);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.agents.get(name).cloned()
    }

    pub fn has_agent(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    pub fn agent_names(&self) -> Vec<String> {
        self.agents.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
