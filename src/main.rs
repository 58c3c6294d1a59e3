use patient_service::config::{Config, StorageBackend};
use patient_service::{
    app, fixtures, AppState, InMemoryPatientRepository, PatientRepository, PgPatientRepository,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let repo: Arc<dyn PatientRepository> = match config.storage {
        StorageBackend::Postgres => {
            let repo = PgPatientRepository::connect(&config).await?;
            repo.migrate().await?;
            tracing::info!("✓ Database connected and migrated");
            Arc::new(repo)
        }
        StorageBackend::Memory => {
            tracing::warn!("⚠ Using in-memory storage, records are lost on exit");
            Arc::new(InMemoryPatientRepository::new())
        }
    };

    if config.seed_fixtures {
        fixtures::seed(repo.as_ref()).await?;
    }

    let app = app(AppState::new(repo));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("🚀 Server running on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("✗ Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
