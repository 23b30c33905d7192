mod config;
mod status_cmd;

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use devhelper_channels::DiscordClient;
use devhelper_commands::build_default_dispatcher;
use devhelper_config::{config_dir, config_file_path, load_raw, logging_settings, prepare, process_env, redact};
use devhelper_core::ConnectionStateMachine;
use devhelper_gateway::{admin_router, start_server, AdminState, ConnectionSupervisor};
use devhelper_logging::{init_logger, StateEventLogger};

use config::ServeSettings;

#[derive(Parser)]
#[command(name = "devhelper")]
#[command(about = "DevHelper: self-healing Discord helper bot")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $DEVHELPER_CONFIG_DIR/config.yaml or ~/.devhelper/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and serve the admin API
    Serve {
        /// Port for the admin HTTP server
        #[arg(short, long)]
        port: Option<u16>,
        /// Address for the admin HTTP server
        #[arg(short, long)]
        bind: Option<IpAddr>,
    },
    /// Show the status of a running bot
    Status {
        #[arg(short, long, env = "DEVHELPER_PORT", default_value_t = 4000)]
        port: u16,
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, bind } => {
            let path = cli.config.unwrap_or_else(|| config_file_path(&config_dir()));
            run_server(path, port, bind).await?;
        }
        Commands::Status { port, host } => {
            status_cmd::run(&host, port).await?;
        }
    }

    Ok(())
}

async fn run_server(path: PathBuf, port: Option<u16>, bind: Option<IpAddr>) -> Result<()> {
    let env = process_env();
    let raw = load_raw(&path).await?;

    let logging = logging_settings(&raw, &env);
    init_logger(
        logging.dir.as_deref().unwrap_or("logs"),
        logging.level.as_deref().unwrap_or("info"),
        logging.json.unwrap_or(false),
    )?;

    let config = prepare(raw, &env)?;
    debug!(config = %redact(&serde_json::to_value(&config)?), "Effective config");
    let settings = ServeSettings::resolve(&config, port, bind)?;

    info!(
        config = %path.display(),
        addr = %settings.addr,
        max_attempts = settings.policy.max_attempts,
        probe_interval_secs = settings.policy.probe_interval_secs,
        "Starting DevHelper"
    );

    let state = Arc::new(ConnectionStateMachine::new());
    let state_log = StateEventLogger::spawn(state.subscribe());

    let client = Arc::new(DiscordClient::new(settings.token.clone()));
    let supervisor = ConnectionSupervisor::new(client, state, settings.policy.clone());

    let dispatcher = build_default_dispatcher(supervisor.clone());
    info!(commands = dispatcher.registry().len(), "Command registry ready");

    if let Err(e) = supervisor.start(Arc::new(dispatcher)).await {
        // Recovery continues in the background.
        warn!(error = %devhelper_logging::redact_sensitive_data(&e.to_string()), "Bot did not come up on first try");
    }

    let app = admin_router(AdminState::new(supervisor.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    if let Err(e) = start_server(settings.addr, app, shutdown_signal()).await {
        error!(error = %e, "Admin API failed");
    }

    supervisor.shutdown().await;
    state_log.abort();
    info!("DevHelper stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
