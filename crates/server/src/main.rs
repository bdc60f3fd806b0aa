use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hlsladder_core::{
    load_config_or_default, validate_config, CpuBudget, FfmpegEncoder, JobRunner,
    ProgressStore, RenditionEncoder,
};
use hlsladder_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("HLSLADDER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;
    let ladder = config
        .ladder
        .to_ladder()
        .context("Invalid rendition ladder")?;

    info!("Configuration loaded successfully");
    info!("Upload directory: {:?}", config.storage.upload_dir);
    info!(
        renditions = ladder.len(),
        top = ladder.iter().last().map(|r| r.height).unwrap_or(0),
        "Rendition ladder ready"
    );

    tokio::fs::create_dir_all(&config.storage.upload_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create upload directory {:?}",
                config.storage.upload_dir
            )
        })?;

    // Create encoder
    let encoder = FfmpegEncoder::new(config.encoder.clone());
    if let Err(e) = encoder.validate().await {
        warn!("Encoder validation failed, jobs will fail until fixed: {}", e);
    } else if config.encoder.cpu_limit_enabled {
        let budget = CpuBudget::from_host(config.encoder.cpu_share_percent);
        info!(
            cpus = budget.logical_cpus(),
            limit = budget.limit_percent(),
            "Encodes capped by cpulimit"
        );
    }

    let runner = JobRunner::new(Arc::new(encoder), Arc::new(ProgressStore::new()));
    info!("Job runner ready (encoder: {})", runner.encoder_name());

    // Create app state
    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, ladder, runner));

    // Create router
    let app = create_router(state);

    // Start server
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
}
