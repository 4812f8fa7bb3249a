use anyhow::Context;
use mentor::{
    agents::catalog,
    api,
    cli::{output::Output, AgentCommands, Cli, Commands},
    utils::config::{Config, LogFormat},
    AppState,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match cli.command {
        None => serve(None, None).await,
        Some(Commands::Serve { host, port }) => serve(host, port).await,
        Some(Commands::Config { validate }) => show_config(&output, validate),
        Some(Commands::Agents(command)) => show_agents(&output, command, cli.verbose),
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match config.logging.format {
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn serve(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    init_tracing(&config);

    let address = config.bind_address();
    info!(
        provider = ?config.llm.provider,
        model = %config.llm.model,
        project = %config.google.project,
        dataset = %config.bigquery.dataset_id,
        "Starting mentor-server"
    );

    let state = AppState::from_config(config)
        .await
        .context("failed to build the agent graph")?;
    let app = api::app(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    info!(%address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

fn show_config(output: &Output, validate: bool) -> anyhow::Result<()> {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            output.error(&e.to_string());
            return Err(e.into());
        }
    };

    if validate {
        output.success("Configuration is valid");
        return Ok(());
    }

    output.header("Effective configuration");
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn show_agents(output: &Output, command: AgentCommands, verbose: bool) -> anyhow::Result<()> {
    match command {
        AgentCommands::List => {
            output.banner();
            output.header("Agents");
            for declaration in catalog::declarations() {
                if verbose {
                    output.agent(&declaration);
                } else {
                    output.kv(declaration.name, declaration.description);
                }
            }
            output.hint("Use `mentor-server agents show <name>` for tools and instructions");
        }
        AgentCommands::Show { name } => {
            let Some(declaration) = catalog::find(&name) else {
                output.error(&format!("Unknown agent: {}", name));
                anyhow::bail!("unknown agent {}", name);
            };
            output.agent(&declaration);
            if !declaration.instruction.is_empty() {
                output.subheader("Instruction");
                println!("{}", declaration.instruction);
            }
        }
    }
    Ok(())
}
