use async_trait::async_trait;

use crate::core::{FiscalDocument, Period, Result};
use crate::modules::statements::models::Statement;

/// Source of monthly statements
#[async_trait]
pub trait BillingApi: Send + Sync {
    /// Statement of the company identified by its fiscal document
    async fn fetch_by_document(&self, period: Period, document: &FiscalDocument) -> Result<Statement>;

    /// Statement of a single contract
    async fn fetch_by_contract(&self, period: Period, contract_id: &str) -> Result<Statement>;

    /// Provider name, for logs
    fn name(&self) -> &str;
}
