//! Goodpack inventory server binary

use goodpack_backend::{
    catalog::load_catalog,
    config::{Config, DatabaseBackend},
    create_app,
    repositories::Repositories,
    AppState,
};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str =
    "goodpack_server=debug,goodpack_backend=debug,tower_http=debug,sqlx=warn";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first so the log format can be chosen
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    init_tracing(&config.log_format);

    tracing::info!("Starting Goodpack Inventory Server");
    tracing::info!("Environment: {}", config.environment);

    let catalog = load_catalog(&config.catalog.dir)?;

    let repos = match config.database.backend {
        DatabaseBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(&config.database.url)
                .await?;
            tracing::info!("Database connection established");

            // Run migrations in development
            if config.environment == "development" {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations").run(&db_pool).await?;
                tracing::info!("Migrations completed");
            }

            Repositories::postgres(db_pool)
        }
        DatabaseBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on shutdown");
            Repositories::memory()
        }
    };

    tokio::fs::create_dir_all(&config.uploads.dir).await?;

    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::new(host, config.server.port);

    let state = AppState::new(repos, catalog, config);
    let app = create_app(state);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(log_format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let registry = tracing_subscriber::registry().with(filter);
    if log_format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
