use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

use crate::core::Result;
use crate::modules::tokens::models::CachedToken;

/// Storage for the provider bearer token, one row per credential slot
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Load the token row for `slot`, if any
    async fn load(&self, slot: &str) -> Result<Option<CachedToken>>;

    /// Insert the row or overwrite it in place; never creates a second row
    async fn upsert(&self, slot: &str, token: &str, issued_at: DateTime<Utc>) -> Result<()>;
}

pub struct MySqlTokenRepository {
    pool: MySqlPool,
}

impl MySqlTokenRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for MySqlTokenRepository {
    async fn load(&self, slot: &str) -> Result<Option<CachedToken>> {
        let token = sqlx::query_as::<_, CachedToken>(
            r#"
            SELECT slot, token, issued_at
            FROM api_tokens
            WHERE slot = ?
            "#,
        )
        .bind(slot)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    async fn upsert(&self, slot: &str, token: &str, issued_at: DateTime<Utc>) -> Result<()> {
        // `slot` is the primary key, so this is insert-or-update on a single row
        sqlx::query(
            r#"
            INSERT INTO api_tokens (slot, token, issued_at)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE token = VALUES(token), issued_at = VALUES(issued_at)
            "#,
        )
        .bind(slot)
        .bind(token)
        .bind(issued_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
