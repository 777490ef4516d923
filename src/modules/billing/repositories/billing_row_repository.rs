use async_trait::async_trait;
use sqlx::{MySql, MySqlPool, Transaction};

use crate::core::{AppError, Result};
use crate::modules::billing::models::{BillingRow, BucketKey};

/// Billing rows partitioned by (company, import period, source)
#[async_trait]
pub trait BillingRowRepository: Send + Sync {
    /// Remove every row of the bucket, returning how many were deleted
    async fn delete_bucket(&self, key: &BucketKey) -> Result<u64>;

    /// Insert all rows or none
    async fn insert_rows(&self, rows: &[BillingRow]) -> Result<u64>;

    async fn count_bucket(&self, key: &BucketKey) -> Result<u64>;
}

pub struct MySqlBillingRowRepository {
    pool: MySqlPool,
}

impl MySqlBillingRowRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn insert_with_tx(tx: &mut Transaction<'_, MySql>, row: &BillingRow) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO billing_rows (
                company_code, group_code, branch_code, channel_code, source, contract_key,
                contract, plan, coverage, invoice_code, invoice_total,
                beneficiary_code, beneficiary_name, beneficiary_document,
                birth_date, admission_date, holder_code, age, amount, description,
                import_month, import_year, reference_month, reference_year
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(row.company.company_code)
        .bind(row.company.group_code)
        .bind(row.company.branch_code)
        .bind(row.company.channel_code)
        .bind(row.source.kind())
        .bind(row.source.contract_key())
        .bind(&row.contract)
        .bind(&row.plan)
        .bind(&row.coverage)
        .bind(&row.invoice_code)
        .bind(row.invoice_total)
        .bind(&row.beneficiary_code)
        .bind(&row.beneficiary_name)
        .bind(&row.beneficiary_document)
        .bind(row.birth_date)
        .bind(row.admission_date)
        .bind(&row.holder_code)
        .bind(row.age)
        .bind(row.amount)
        .bind(&row.description)
        .bind(row.import_period.month())
        .bind(row.import_period.year())
        .bind(row.reference_period.month())
        .bind(row.reference_period.year())
        .execute(tx.as_mut())
        .await
        .map_err(|e| AppError::Internal(format!("Failed to insert billing row: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl BillingRowRepository for MySqlBillingRowRepository {
    async fn delete_bucket(&self, key: &BucketKey) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM billing_rows
            WHERE company_code = ? AND group_code = ? AND branch_code = ? AND channel_code = ?
              AND import_month = ? AND import_year = ?
              AND source = ? AND contract_key = ?
            "#,
        )
        .bind(key.company.company_code)
        .bind(key.company.group_code)
        .bind(key.company.branch_code)
        .bind(key.company.channel_code)
        .bind(key.import_period.month())
        .bind(key.import_period.year())
        .bind(key.source.kind())
        .bind(key.source.contract_key())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn insert_rows(&self, rows: &[BillingRow]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;

        for row in rows {
            Self::insert_with_tx(&mut tx, row).await?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))?;

        Ok(rows.len() as u64)
    }

    async fn count_bucket(&self, key: &BucketKey) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM billing_rows
            WHERE company_code = ? AND group_code = ? AND branch_code = ? AND channel_code = ?
              AND import_month = ? AND import_year = ?
              AND source = ? AND contract_key = ?
            "#,
        )
        .bind(key.company.company_code)
        .bind(key.company.group_code)
        .bind(key.company.branch_code)
        .bind(key.company.channel_code)
        .bind(key.import_period.month())
        .bind(key.import_period.year())
        .bind(key.source.kind())
        .bind(key.source.contract_key())
        .fetch_one(&self.pool)
        .await?;

        Ok(count as u64)
    }
}
