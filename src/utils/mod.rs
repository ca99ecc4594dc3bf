/// TOML configuration: server, LLM, tools, agents and tasks.
pub mod toml_config;
