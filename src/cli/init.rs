//! Init command implementation
//!
//! Writes a starter `notecrew.toml` (the built-in five-agent crew) and an
//! `.env.example` listing the variables it references.

use super::output::Output;
use crate::utils::toml_config::DEFAULT_CONFIG;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// Project already exists (notecrew.toml found)
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// Host address for the server
    pub host: String,
    /// Port for the server
    pub port: u16,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing notecrew");

    let base_path = &config.path;

    let config_path = base_path.join("notecrew.toml");
    if config_path.exists() && !config.force {
        output.warning("notecrew.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    if !base_path.exists() {
        if let Err(e) = fs::create_dir_all(base_path) {
            output.error(&format!("Failed to create {}: {}", base_path.display(), e));
            return InitResult::Error(e.to_string());
        }
        output.created("directory", &base_path.display().to_string());
    }

    output.subheader("Creating configuration files");

    let toml_content = generate_config(&config);
    if let Err(e) = write_file(&config_path, &toml_content, config.force) {
        output.error(&format!("Failed to create notecrew.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("config", "notecrew.toml");

    let env_example_path = base_path.join(".env.example");
    if let Err(e) = write_file(&env_example_path, &generate_env_example(), config.force) {
        output.error(&format!("Failed to create .env.example: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("env", ".env.example");

    let gitignore_path = base_path.join(".gitignore");
    if !gitignore_path.exists() {
        if let Err(e) = write_file(&gitignore_path, &generate_gitignore(), false) {
            output.warning(&format!("Failed to create .gitignore: {}", e));
        } else {
            output.created("file", ".gitignore");
        }
    }

    output.complete("notecrew initialized successfully!");

    output.header("Next Steps");
    output.newline();
    output.info("1. Set up environment variables:");
    output.command("cp .env.example .env");
    output.command("# Edit .env and set SERPER_API_KEY for web search");
    output.newline();
    output.info("2. Start the model server (if not running):");
    output.command("ollama serve");
    output.newline();
    output.info("3. Start the server:");
    output.command("notecrew-server");
    output.newline();

    output.hint(&format!(
        "The research page will be available at http://{}:{}",
        config.host, config.port
    ));

    InitResult::Success
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(());
    }
    fs::write(path, content)
}

fn generate_config(config: &InitConfig) -> String {
    DEFAULT_CONFIG
        .replacen(
            "host = \"127.0.0.1\"",
            &format!("host = \"{}\"", config.host),
            1,
        )
        .replacen("port = 8501", &format!("port = {}", config.port), 1)
}

fn generate_env_example() -> String {
    r#"# notecrew Environment Variables
# ==============================
# Copy this file to .env and fill in the values.

# REQUIRED: key for the OpenAI-compatible LLM server.
# Local servers (Ollama) accept any value.
OPENAI_API_KEY=NA

# Optional: Serper key for the web_search tool (https://serper.dev).
# Without it, set [search] backend = "duckduckgo" in notecrew.toml.
SERPER_API_KEY=your-serper-key

# Optional: Logging level (trace, debug, info, warn, error)
RUST_LOG=info,notecrew=debug
"#
    .to_string()
}

fn generate_gitignore() -> String {
    r#"# notecrew output
notes.md

# Environment
.env
.env.local

# Rust
/target/
"#
    .to_string()
}
