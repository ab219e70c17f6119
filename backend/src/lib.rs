//! Goodpack inventory server
//!
//! Products, customers, purchases, sales and quotations, with a running stock and price
//! ledger on every product and an audit trail of each stock change.

use axum::{routing::get, Router};
use shared::Catalog;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod repositories;
pub mod routes;
pub mod services;

pub use config::Config;
use repositories::Repositories;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub catalog: Arc<Catalog>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(repos: Repositories, catalog: Catalog, config: Config) -> Self {
        Self {
            repos,
            catalog: Arc::new(catalog),
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let uploads = ServeDir::new(&state.config.uploads.dir);

    Router::new()
        .route("/", get(root))
        .nest("/api", routes::api_routes(&state.config))
        .nest_service("/uploads", uploads)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Goodpack Inventory API v1.0"
}
