use std::sync::Arc;

use chrono::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::core::{Clock, Result};
use crate::modules::tokens::models::CachedToken;
use crate::modules::tokens::repositories::TokenRepository;

/// Provider token lifetime
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 6;

/// Persistent cache for the billing API bearer token.
///
/// The provider caps token issuance per day across the whole organization,
/// so the token lives in the database and survives restarts. An in-process
/// copy avoids a round trip on every fetch.
///
/// Token states: absent, valid (until the TTL elapses or the API answers
/// 401), then absent again.
pub struct TokenCache {
    repository: Arc<dyn TokenRepository>,
    clock: Arc<dyn Clock>,
    slot: String,
    ttl: Duration,
    state: Mutex<CacheState>,
}

#[derive(Default)]
struct CacheState {
    current: Option<CachedToken>,
    /// Token the API rejected; ignored if read back from storage
    rejected: Option<String>,
}

impl TokenCache {
    pub fn new(
        repository: Arc<dyn TokenRepository>,
        clock: Arc<dyn Clock>,
        slot: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            repository,
            clock,
            slot: slot.into(),
            ttl,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Return the cached token if it is still inside its validity window.
    ///
    /// Storage errors are logged and reported as "no token", so the caller
    /// refreshes instead of failing the run.
    pub async fn get_valid(&self) -> Option<String> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        if let Some(current) = &state.current {
            if current.is_valid_at(now, self.ttl) {
                return Some(current.token.clone());
            }
            state.current = None;
        }

        let stored = match self.repository.load(&self.slot).await {
            Ok(stored) => stored?,
            Err(e) => {
                warn!(slot = %self.slot, error = %e, "Token cache read failed, treating as empty");
                return None;
            }
        };

        if state.rejected.as_deref() == Some(stored.token.as_str()) {
            debug!(slot = %self.slot, "Stored token was rejected by the API");
            return None;
        }

        if !stored.is_valid_at(now, self.ttl) {
            debug!(slot = %self.slot, issued_at = %stored.issued_at, "Stored token expired");
            return None;
        }

        let token = stored.token.clone();
        state.current = Some(stored);
        Some(token)
    }

    /// Record a freshly issued token with the current time as its issuance.
    ///
    /// The in-process copy is updated even when persisting fails, so the
    /// token just paid for is still used by this process.
    pub async fn save(&self, token: impl Into<String>) -> Result<CachedToken> {
        let cached = CachedToken::new(self.slot.clone(), token, self.clock.now());

        {
            let mut state = self.state.lock().await;
            state.current = Some(cached.clone());
            state.rejected = None;
        }

        self.repository
            .upsert(&cached.slot, &cached.token, cached.issued_at)
            .await?;

        debug!(slot = %self.slot, issued_at = %cached.issued_at, "Token cached");
        Ok(cached)
    }

    /// Drop `token` after the API rejected it. A newer token saved in the
    /// meantime by another caller is left alone.
    pub async fn invalidate(&self, token: &str) {
        let mut state = self.state.lock().await;
        if state.current.as_ref().map(|c| c.token.as_str()) == Some(token) {
            state.current = None;
        }
        state.rejected = Some(token.to_string());
    }
}
