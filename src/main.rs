use anyhow::Result;
use seniorfit::api::routes::create_routes;
use seniorfit::config::{run_migrations, AppConfig, DatabaseConfig, DatabaseSeeder};
use seniorfit::store::PgStore;
use seniorfit::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;

    // RUST_LOG wins over LOG_LEVEL when both are set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("seniorfit={0},tower_http={0}", config.log_level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let db_config = DatabaseConfig::from_env()?;
    info!(database = %db_config.redacted_url(), "connecting to database");
    let pool = db_config.create_pool().await?;
    run_migrations(&pool).await?;

    let store = Arc::new(PgStore::new(pool));

    if config.seed_database {
        let admin = config
            .admin_email
            .as_deref()
            .zip(config.admin_password.as_deref());
        DatabaseSeeder::new(store.clone(), config.bcrypt_cost)
            .seed_all(admin)
            .await?;
    }

    let address = config.server_address();
    let state = AppState::new(store, config);

    let rate_limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            rate_limiter.cleanup();
        }
    });

    let app = create_routes(state);

    let listener = TcpListener::bind(&address).await?;
    info!("seniorfit API listening on http://{}", address);
    info!("Health check available at http://{}/health", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
