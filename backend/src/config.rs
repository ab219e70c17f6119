//! Configuration management for the Goodpack inventory server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with GOODPACK_ prefix
//! 4. The plain `PORT` and `DATABASE_URL` variables used by older deployments

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Location of the category/color/account tables
    pub catalog: CatalogConfig,

    /// Product image storage
    pub uploads: UploadConfig,

    /// CSV import limits
    pub migration: MigrationConfig,

    /// QR payload settings
    pub qr: QrConfig,

    /// `text` or `json`
    pub log_format: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,

    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    /// Directory holding categories.json, colors.json and accounts.json
    pub dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    pub dir: String,
    pub max_image_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MigrationConfig {
    pub max_csv_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QrConfig {
    /// Prefix of the product URL encoded in QR codes
    pub base_url: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("GOODPACK_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let mut builder = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 8080)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.backend", "postgres")?
            .set_default("database.url", "postgres://localhost/goodpack")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("catalog.dir", "config")?
            .set_default("uploads.dir", "uploads")?
            .set_default("uploads.max_image_bytes", 5 * 1024 * 1024)?
            .set_default("migration.max_csv_bytes", 10 * 1024 * 1024)?
            .set_default("qr.base_url", "https://goodpack.example.com")?
            .set_default("log_format", "text")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (GOODPACK_ prefix)
            .add_source(
                Environment::with_prefix("GOODPACK")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Ok(port) = std::env::var("PORT") {
            builder = builder.set_override("server.port", port)?;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", url)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Configuration for tests: in-memory store, temporary directories supplied by the caller
    pub fn for_tests(uploads_dir: &str) -> Self {
        Self {
            environment: "test".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig {
                backend: DatabaseBackend::Memory,
                url: String::new(),
                max_connections: 1,
                min_connections: 1,
            },
            catalog: CatalogConfig {
                dir: "config".to_string(),
            },
            uploads: UploadConfig {
                dir: uploads_dir.to_string(),
                max_image_bytes: 5 * 1024 * 1024,
            },
            migration: MigrationConfig {
                max_csv_bytes: 10 * 1024 * 1024,
            },
            qr: QrConfig {
                base_url: "https://goodpack.example.com".to_string(),
            },
            log_format: "text".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
        }
    }
}
