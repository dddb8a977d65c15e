use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use local_converter_core::{
    load_config, validate_config, AssetSource, AssetSourceKind, Config, ConverterPool,
    DirAssetSource, Engine, FfmpegEngine, HttpAssetSource,
};
use local_converter_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

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
    let config_path = std::env::var("LOCAL_CONVERTER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!(version = VERSION, "Configuration loaded successfully");
    info!("Asset source: {}", config.assets.source.as_str());
    info!(
        "Converter pool: {} member(s), staging {:?}",
        config.converter.pool_size, config.converter.staging
    );

    // Fetch engine assets and load one engine per pool member
    let assets = create_asset_source(&config)?;
    let converter_config = config.converter.clone();
    let mut index = 0;
    let pool = ConverterPool::setup(
        converter_config.pool_size,
        || {
            let engine = FfmpegEngine::new(converter_config.engine_config(index));
            index += 1;
            Arc::new(engine) as Arc<dyn Engine>
        },
        assets.as_ref(),
        converter_config.setup_options(),
    )
    .await
    .context("Failed to set up converter pool")?;
    info!("Converter pool ready");

    // Create app state
    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, pool));

    // Create router
    let app = create_router(Arc::clone(&state));

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

    // The router is gone, so this is the last reference
    info!("Server shutting down...");
    match Arc::try_unwrap(state) {
        Ok(state) => {
            state.into_pool().release();
            info!("Converter pool released");
        }
        Err(_) => warn!("Converter pool still referenced at shutdown; engines dropped without release"),
    }

    Ok(())
}

fn create_asset_source(config: &Config) -> Result<Box<dyn AssetSource>> {
    let source: Box<dyn AssetSource> = match config.assets.source {
        AssetSourceKind::Http => {
            let base_url = config
                .assets
                .base_url
                .clone()
                .context("assets.base_url is not set")?;
            info!("Fetching engine assets from {}", base_url);
            Box::new(HttpAssetSource::new(base_url))
        }
        AssetSourceKind::Dir => {
            let dir = config.assets.dir.clone().context("assets.dir is not set")?;
            info!("Reading engine assets from {:?}", dir);
            Box::new(DirAssetSource::new(dir))
        }
    };
    Ok(source)
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
