use serde::Deserialize;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use std::env;
use std::time::Duration;

use super::parse_or;
use crate::core::{AppError, Result};

/// MySQL pool settings
///
/// An import run holds at most `IMPORT_CONCURRENCY` connections for row
/// replacement plus one for token reads, so the defaults stay small.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    /// Connections kept open while idle
    pub pool_size: u32,
    pub max_connections: u32,
    /// How long a caller waits for a free connection before the entity fails
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self> {
        let url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Configuration("DATABASE_URL not set".to_string()))?;

        Ok(DatabaseConfig {
            url,
            pool_size: parse_or("DATABASE_POOL_SIZE", 2)?,
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
            acquire_timeout_secs: parse_or("DATABASE_ACQUIRE_TIMEOUT_SECS", 30)?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 || self.pool_size > self.max_connections {
            return Err(AppError::Configuration(format!(
                "Database pool size {} must not exceed max connections {} (> 0)",
                self.pool_size, self.max_connections
            )));
        }

        if self.acquire_timeout_secs == 0 {
            return Err(AppError::Configuration(
                "Database acquire timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Open the pool; connections are pinged before use
    pub async fn create_pool(&self) -> Result<MySqlPool> {
        MySqlPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.pool_size)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .test_before_acquire(true)
            .connect(&self.url)
            .await
            .map_err(AppError::Database)
    }
}
