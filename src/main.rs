use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checkup_analyzer::{handlers::create_router, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "checkup_analyzer=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // A missing API key is fatal here
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!("Starting Health Checkup Analyzer");
    tracing::info!("Max file size: {}MB", config.max_file_size_mb);
    tracing::info!("Max concurrent analyses: {}", config.max_concurrent_analyses);
    tracing::info!("Exporting reports to {}", config.export_dir.display());

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let state = AppState::from_config(config).context("Failed to build application state")?;
    let app = create_router(state);

    tracing::info!("Server listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
