//! Image studio server - local API for project management and image generation.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use studio_server::{config, logging, routes, state};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use config::Config;
use logging::{LogConfig, LogFormat, LogPreset};
use state::AppState;

/// Image studio server.
#[derive(Parser, Debug)]
#[command(name = "studio-server")]
#[command(about = "Local API for image generation projects")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override port from config
    #[arg(short, long)]
    port: Option<u16>,

    /// Open this project on startup
    #[arg(long, value_name = "DIR")]
    open: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging
    #[arg(long)]
    trace: bool,

    /// Warnings and errors only
    #[arg(short, long)]
    quiet: bool,

    /// Per-target log level, e.g. "generation=debug". Repeatable.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let preset = LogPreset::from_flags(cli.verbose, cli.debug, cli.trace, cli.quiet);
    logging::init(&LogConfig::new(preset, &cli.log_overrides, cli.log_format));

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(port) = cli.port {
        config.port = port;
    }

    tracing::info!(
        target: "studio::startup",
        "Loaded configuration (port: {}, app config: {})",
        config.port,
        config.app_config_path.display()
    );

    let state = Arc::new(AppState::new(config.clone())?);

    if let Some(project) = &cli.open {
        state.projects.open(project).await?;
        state.recent_projects.touch(project)?;
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::router(state.clone())
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!(target: "studio::startup", "Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    state.projects.close().await;
    tracing::info!(target: "studio::startup", "Shut down");
    Ok(())
}
