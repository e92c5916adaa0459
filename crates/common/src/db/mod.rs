//! Property store layer for PropPilot
//!
//! Provides:
//! - SeaORM entity models
//! - The `PropertyStore` seam with PostgreSQL and in-memory backends
//! - Connection pool management and embedded migrations
//! - The filter language shared by all backends

pub mod filter;
mod memory;
pub mod models;
mod record;
mod repository;

pub use filter::{NumericRange, PropertyFilter, TextMatch, TextMode};
pub use memory::InMemoryStore;
pub use record::{ContactInfo, PropertyRecord, PropertyStatus};
pub use repository::{Page, PropertyStore, Repository};

use crate::config::StoreConfig;
use crate::errors::{AppError, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct DbPool {
    connection: DatabaseConnection,
}

impl DbPool {
    /// Create a new database pool from configuration
    pub async fn new(config: &StoreConfig) -> Result<Self> {
        info!("Connecting to property database...");

        let mut opts = ConnectOptions::new(&config.url);
        opts.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .sqlx_logging(false);

        let connection = Database::connect(opts)
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to connect: {}", e),
            })?;

        info!("Database connection established");

        Ok(Self { connection })
    }

    /// Get the connection for reads
    pub fn read(&self) -> &DatabaseConnection {
        &self.connection
    }

    /// Apply the embedded SQL migrations
    pub async fn migrate(&self) -> Result<()> {
        let pool = self.connection.get_postgres_connection_pool();
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.connection
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Ping failed: {}", e),
            })?;
        Ok(())
    }
}

/// Create a property store based on configuration
pub async fn create_store(config: &StoreConfig) -> Result<Arc<dyn PropertyStore>> {
    match config.backend.as_str() {
        "postgres" => {
            let pool = DbPool::new(config).await?;
            if config.run_migrations {
                pool.migrate().await?;
            }
            Ok(Arc::new(Repository::new(pool)))
        }
        "memory" => {
            tracing::warn!("Using in-memory property store; listings are not persisted");
            Ok(Arc::new(InMemoryStore::new()))
        }
        other => Err(AppError::Configuration {
            message: format!("unknown store backend '{}'", other),
        }),
    }
}
