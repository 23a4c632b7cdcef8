//! PostgreSQL/PostGIS storage adapter

pub mod config;
pub mod loader;
pub mod migrations;

pub use config::{ConfigError, ConnectionTarget, PoolConfig, PostgresConfig};
pub use migrations::{MigrationError, MigrationManager, MigrationStatus};

use sn7meta_core::error::{Result, Sn7Error};
use sqlx::{postgres::PgPoolOptions, PgPool};

impl From<ConfigError> for Sn7Error {
    fn from(e: ConfigError) -> Self {
        Sn7Error::Storage(e.to_string())
    }
}

impl From<MigrationError> for Sn7Error {
    fn from(e: MigrationError) -> Self {
        Sn7Error::Storage(e.to_string())
    }
}

/// Star-schema store backed by PostgreSQL with PostGIS
pub struct PostgresStarSchemaStore {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresStarSchemaStore {
    /// Connect and verify the connection
    pub async fn new(config: PostgresConfig) -> Result<Self> {
        config.validate()?;

        let pool = PgPoolOptions::new()
            .min_connections(config.pool.min_connections)
            .max_connections(config.pool.max_connections)
            .acquire_timeout(config.pool.acquire_timeout)
            .idle_timeout(config.pool.idle_timeout)
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| Sn7Error::Storage(format!("Failed to connect to database: {}", e)))?;

        let store = Self { pool, config };
        store.health_check().await?;
        tracing::info!(target = ?store.config.target, "Connected to PostgreSQL");
        Ok(store)
    }

    /// Connect and create the star-schema tables if needed
    pub async fn with_migrations(config: PostgresConfig) -> Result<Self> {
        let store = Self::new(config).await?;
        store.run_migrations().await?;
        Ok(store)
    }

    pub async fn run_migrations(&self) -> Result<()> {
        let manager = MigrationManager::new(self.pool.clone());
        if manager.has_pending_migrations().await? {
            tracing::info!("Applying star-schema migrations");
        }
        manager.run_migrations().await?;
        Ok(())
    }

    pub async fn migration_status(&self) -> Result<Vec<MigrationStatus>> {
        Ok(MigrationManager::new(self.pool.clone()).check_status().await?)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn config(&self) -> &PostgresConfig {
        &self.config
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Sn7Error::Storage(format!("Health check failed: {}", e)))?;
        Ok(())
    }
}
