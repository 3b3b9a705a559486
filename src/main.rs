use creditbook::{routes::create_router, AppState, Config};
use migration::{Migrator, MigratorTrait};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,creditbook=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting creditbook");

    // Load configuration
    let config = Config::load()?;

    tracing::info!(
        "Loaded configuration - Server: {}:{}, admission attempts: {}",
        config.server.host,
        config.server.port,
        config.admission.max_attempts
    );

    // Initialize application state
    let state = AppState::new(config.clone()).await?;

    // Bring the schema up to date before accepting traffic
    Migrator::up(&state.db, None).await?;

    tracing::info!("Initialized application state");

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
