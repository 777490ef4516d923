use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::config::is_sql_identifier;
use crate::core::{AppError, Period, Result};

/// Downstream aggregation, a stored procedure opaque to the pipeline
#[async_trait]
pub trait AggregationRepository: Send + Sync {
    async fn aggregate(&self, reference_period: Period) -> Result<()>;
}

pub struct MySqlAggregationRepository {
    pool: MySqlPool,
    procedure: String,
}

impl MySqlAggregationRepository {
    pub fn new(pool: MySqlPool, procedure: impl Into<String>) -> Result<Self> {
        let procedure = procedure.into();
        if !is_sql_identifier(&procedure) {
            return Err(AppError::Configuration(format!(
                "Invalid aggregation procedure name: {}",
                procedure
            )));
        }
        Ok(Self { pool, procedure })
    }
}

#[async_trait]
impl AggregationRepository for MySqlAggregationRepository {
    async fn aggregate(&self, reference_period: Period) -> Result<()> {
        // Identifier checked in `new`; CALL cannot bind a procedure name
        let statement = format!("CALL {}(?, ?)", self.procedure);

        sqlx::query(&statement)
            .bind(reference_period.month())
            .bind(reference_period.year())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
