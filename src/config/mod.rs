use crate::core::{AppError, Result};
use serde::Deserialize;
use std::env;
use std::str::FromStr;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub billing_api: BillingApiConfig,
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    /// `json` switches the tracing formatter to JSON lines
    pub log_format: String,
}

/// Provider connection settings. Credentials only ever come from the environment.
#[derive(Clone, Deserialize)]
pub struct BillingApiConfig {
    pub base_url: String,
    pub user: String,
    pub password: String,
    pub timeout_secs: u64,
    /// Key of the persisted token row
    pub token_slot: String,
    pub token_ttl_hours: i64,
}

impl std::fmt::Debug for BillingApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingApiConfig")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("token_slot", &self.token_slot)
            .field("token_ttl_hours", &self.token_ttl_hours)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    /// Entities processed at once; 1 keeps the run strictly sequential
    pub concurrency: usize,
    /// Stored procedure invoked by the aggregation entry point
    pub aggregation_procedure: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            billing_api: BillingApiConfig {
                base_url: required("BILLING_API_BASE_URL")?,
                user: required("BILLING_API_USER")?,
                password: required("BILLING_API_PASSWORD")?,
                timeout_secs: parse_or("BILLING_API_TIMEOUT_SECS", 30)?,
                token_slot: env::var("TOKEN_SLOT").unwrap_or_else(|_| "default".to_string()),
                token_ttl_hours: parse_or("TOKEN_TTL_HOURS", 6)?,
            },
            import: ImportConfig {
                concurrency: parse_or("IMPORT_CONCURRENCY", 1)?,
                aggregation_procedure: env::var("AGGREGATION_PROCEDURE")
                    .unwrap_or_else(|_| "sp_billing_aggregate".to_string()),
            },
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.database.validate()?;

        if self.billing_api.timeout_secs == 0 {
            return Err(AppError::Configuration(
                "Billing API timeout must be greater than 0".to_string(),
            ));
        }

        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.billing_api.token_ttl_hours) {
            return Err(AppError::Configuration(format!(
                "Token TTL must be between 1 and {} hours, got {}",
                MAX_TOKEN_TTL_HOURS, self.billing_api.token_ttl_hours
            )));
        }

        if self.import.concurrency == 0 {
            return Err(AppError::Configuration(
                "Import concurrency must be greater than 0".to_string(),
            ));
        }

        if !is_sql_identifier(&self.import.aggregation_procedure) {
            return Err(AppError::Configuration(format!(
                "Invalid aggregation procedure name: {}",
                self.import.aggregation_procedure
            )));
        }

        Ok(())
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).map_err(|_| AppError::Configuration(format!("{} not set", key)))
}

/// Provider tokens never outlive a day
pub const MAX_TOKEN_TTL_HOURS: i64 = 24;

pub(crate) fn parse_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::Configuration(format!("Invalid {}", key))),
        Err(_) => Ok(default),
    }
}

/// Procedure names are interpolated into `CALL`, so only `[A-Za-z0-9_]` is accepted
pub fn is_sql_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
