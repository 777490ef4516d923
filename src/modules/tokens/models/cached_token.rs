use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The single persisted bearer token for one credential slot
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CachedToken {
    /// Credential slot the token was issued for (primary key)
    pub slot: String,

    /// Raw bearer token
    pub token: String,

    /// When the provider issued it
    pub issued_at: DateTime<Utc>,
}

impl CachedToken {
    pub fn new(slot: impl Into<String>, token: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            slot: slot.into(),
            token: token.into(),
            issued_at,
        }
    }

    /// Usable only while `now - issued_at < ttl`
    pub fn is_valid_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.issued_at < ttl
    }
}

impl std::fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedToken")
            .field("slot", &self.slot)
            .field("token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .finish()
    }
}
