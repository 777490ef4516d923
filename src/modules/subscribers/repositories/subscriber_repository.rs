use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::core::Result;
use crate::modules::subscribers::models::{Company, Contract};

/// Read-only view of the subscriber registry
#[async_trait]
pub trait SubscriberRepository: Send + Sync {
    /// Companies flagged as actively syncing
    async fn list_syncing_companies(&self) -> Result<Vec<Company>>;

    /// Active contracts
    async fn list_active_contracts(&self) -> Result<Vec<Contract>>;
}

pub struct MySqlSubscriberRepository {
    pool: MySqlPool,
}

impl MySqlSubscriberRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriberRepository for MySqlSubscriberRepository {
    async fn list_syncing_companies(&self) -> Result<Vec<Company>> {
        let companies = sqlx::query_as::<_, Company>(
            r#"
            SELECT company_code, group_code, branch_code, channel_code,
                   name, document, syncing
            FROM subscriber_companies
            WHERE syncing = TRUE
            ORDER BY company_code, group_code, branch_code, channel_code
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(companies)
    }

    async fn list_active_contracts(&self) -> Result<Vec<Contract>> {
        let contracts = sqlx::query_as::<_, Contract>(
            r#"
            SELECT contract_id, company_code, group_code, branch_code, channel_code, active
            FROM subscriber_contracts
            WHERE active = TRUE
            ORDER BY contract_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(contracts)
    }
}
