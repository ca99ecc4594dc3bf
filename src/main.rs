//! notecrew-server - HTTP server and CLI entry point

use anyhow::Context;
use notecrew::{
    api::routes::create_app,
    cli::{
        init::{self, InitConfig, InitResult},
        output::Output,
        Cli, Commands,
    },
    llm,
    utils::toml_config::{LogFormat, NotecrewConfig, ServerConfig},
    AppError, AppState, PipelineRunner, RunState, ToolRegistry,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = Output::from_flag(cli.no_color);

    match cli.command {
        Some(Commands::Init {
            path,
            force,
            host,
            port,
        }) => {
            let result = init::run(
                InitConfig {
                    path,
                    force,
                    host,
                    port,
                },
                &output,
            );
            match result {
                InitResult::Success | InitResult::AlreadyExists => Ok(()),
                InitResult::Error(e) => Err(anyhow::anyhow!(e)),
            }
        }
        Some(Commands::Config { validate }) => {
            let config = NotecrewConfig::load_or_builtin(&cli.config)?;
            show_config(&config, validate, &output)
        }
        Some(Commands::Run { topic }) => {
            let config = NotecrewConfig::load_or_builtin(&cli.config)?;
            init_tracing(&config.server, cli.verbose);
            run_once(config, &topic, output).await
        }
        Some(Commands::Serve { host, port }) => {
            let mut config = NotecrewConfig::load_or_builtin(&cli.config)?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            init_tracing(&config.server, cli.verbose);
            serve(config, cli.config.exists()).await
        }
        None => {
            let config = NotecrewConfig::load_or_builtin(&cli.config)?;
            init_tracing(&config.server, cli.verbose);
            serve(config, cli.config.exists()).await
        }
    }
}

fn init_tracing(server: &ServerConfig, verbose: bool) {
    let default_directives = if verbose {
        "notecrew=debug,tower_http=debug".to_string()
    } else {
        format!("notecrew={},tower_http=info", server.log_level)
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));
    let registry = tracing_subscriber::registry().with(filter);

    match server.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn build_runner(config: &NotecrewConfig) -> anyhow::Result<PipelineRunner> {
    let api_key = config
        .llm_api_key()
        .context("The LLM API key variable must be set (any value works for local servers)")?;
    let client = llm::create_client(&config.llm, api_key)?;
    let tools = Arc::new(ToolRegistry::from_config(config)?);
    Ok(PipelineRunner::from_config(config, client, tools)?)
}

async fn serve(config: NotecrewConfig, config_file_found: bool) -> anyhow::Result<()> {
    if !config_file_found {
        warn!("No configuration file found, running the built-in crew");
    }

    let runner = build_runner(&config)?;
    info!(
        model = %config.llm.model,
        api_base = %config.llm.api_base,
        tasks = runner.tasks().len(),
        "Pipeline ready"
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, runner);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Serving the research page on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}

async fn run_once(config: NotecrewConfig, topic: &str, output: Output) -> anyhow::Result<()> {
    let runner = Arc::new(build_runner(&config)?);

    let progress = tokio::spawn(report_progress(Arc::clone(&runner), output));
    let result = runner.run(topic).await;
    progress.abort();

    match result {
        Ok(record) => {
            println!("{}", record.final_markdown);
            output.run_summary(&record);
            Ok(())
        }
        Err(AppError::TaskFailed { task, source, log }) => {
            eprintln!("{}", log);
            output.error(&format!("Task '{}' failed: {}", task, source));
            Err(anyhow::anyhow!("research run failed at task '{}'", task))
        }
        Err(e) => Err(e.into()),
    }
}

/// Print a progress line each time the runner moves to the next task
async fn report_progress(runner: Arc<PipelineRunner>, output: Output) {
    let total = runner.tasks().len();
    let mut reported = None;
    let mut ticker = tokio::time::interval(Duration::from_millis(200));

    loop {
        ticker.tick().await;
        if let RunState::Running { task_index, task } = runner.state() {
            if reported != Some(task_index) {
                reported = Some(task_index);
                let agent = runner
                    .tasks()
                    .get(task_index)
                    .map(|t| t.agent.as_str())
                    .unwrap_or("-");
                output.task_started(task_index, total, &task, agent);
            }
        }
    }
}

fn show_config(config: &NotecrewConfig, validate: bool, output: &Output) -> anyhow::Result<()> {
    output.header("Configuration");
    output.kv(
        "server",
        &format!("{}:{}", config.server.host, config.server.port),
    );
    output.kv("llm", &format!("{} @ {}", config.llm.model, config.llm.api_base));
    output.kv("search", &format!("{:?}", config.search.backend));
    output.kv("output dir", &config.output.dir.display().to_string());

    output.subheader("Agents");
    output.agent_list(config);

    output.subheader("Tasks");
    output.pipeline_table(config);

    if validate {
        output.subheader("Validation");
        for warning in config.validate_with_warnings()? {
            output.warning(&warning.message);
        }
        match config.validate_env() {
            Ok(()) => output.success("Configuration is valid"),
            Err(e) => {
                output.error(&e.to_string());
                return Err(e.into());
            }
        }
    }

    Ok(())
}
