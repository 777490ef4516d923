use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::billing_api::BillingApi;
use crate::config::BillingApiConfig;
use crate::core::{AppError, FiscalDocument, Period, Result};
use crate::modules::statements::models::{CompanyStatementWire, ContractStatementWire, Statement};
use crate::modules::tokens::TokenCache;

const TOKEN_PATH: &str = "/Token/geratoken";
const BY_DOCUMENT_PATH: &str = "/Demonstrativo/buscaporperiodocnpj";
const BY_CONTRACT_PATH: &str = "/Demonstrativo/BuscarPorPeriodoContrato";

/// Billing API client
///
/// Every call carries the cached bearer token. A 401 invalidates it and the
/// call is retried exactly once with a freshly issued token; a second 401 is
/// a fetch error. Token issuance is serialized so concurrent 401s issue a
/// single token between them.
pub struct HttpBillingClient {
    client: Client,
    base_url: String,
    user: String,
    password: String,
    tokens: Arc<TokenCache>,
    refresh_lock: Mutex<()>,
}

impl HttpBillingClient {
    /// Build a client with the configured per-call timeout
    pub fn new(config: &BillingApiConfig, tokens: Arc<TokenCache>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self::with_client(
            client,
            config.base_url.clone(),
            config.user.clone(),
            config.password.clone(),
            tokens,
        ))
    }

    pub fn with_client(
        client: Client,
        base_url: String,
        user: String,
        password: String,
        tokens: Arc<TokenCache>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            user,
            password,
            tokens,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Request a new token from the provider. Each call spends daily quota.
    async fn issue_token(&self) -> Result<String> {
        let url = format!("{}{}", self.base_url, TOKEN_PATH);

        let response = self
            .client
            .post(&url)
            .header("usuario", &self.user)
            .header("senha", &self.password)
            .send()
            .await
            .map_err(|e| AppError::fetch(format!("token issuance request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::fetch(format!("failed to read token response: {}", e)))?;

        if !status.is_success() {
            return Err(AppError::fetch(format!(
                "token issuance failed - HTTP {}",
                status.as_u16()
            )));
        }

        let token = normalize_token(&body);
        if token.is_empty() {
            return Err(AppError::fetch("token issuance returned an empty body"));
        }

        info!(slot = %self.tokens.slot(), "Issued new billing API token");
        Ok(token)
    }

    /// Cached token, or a new one if none is valid
    async fn bearer(&self) -> Result<String> {
        if let Some(token) = self.tokens.get_valid().await {
            return Ok(token);
        }
        self.refresh(None).await
    }

    /// Issue and cache a token, unless another caller already replaced
    /// `stale` while this one waited for the lock.
    async fn refresh(&self, stale: Option<&str>) -> Result<String> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(token) = self.tokens.get_valid().await {
            if stale != Some(token.as_str()) {
                debug!("Token refreshed by a concurrent caller, reusing it");
                return Ok(token);
            }
        }

        let token = self.issue_token().await?;
        if let Err(e) = self.tokens.save(token.clone()).await {
            warn!(error = %e, "Failed to persist billing API token");
        }
        Ok(token)
    }

    /// GET a statement, retrying once on 401
    async fn get_statement<W>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        target: &str,
        period: Period,
    ) -> Result<Statement>
    where
        W: DeserializeOwned + Into<Statement>,
    {
        let token = self
            .bearer()
            .await
            .map_err(|e| with_subject(e, target, period))?;

        match self.send::<W>(path, query, &token, target, period).await {
            Err(AppError::Unauthorized(_)) => {
                warn!(subject = %target, period = %period, "Billing API answered 401, refreshing token");
                self.tokens.invalidate(&token).await;
                let fresh = self
                    .refresh(Some(&token))
                    .await
                    .map_err(|e| with_subject(e, target, period))?;

                match self.send::<W>(path, query, &fresh, target, period).await {
                    Err(AppError::Unauthorized(_)) => {
                        // Rejected right after issuance; nothing valid is cached now
                        self.tokens.invalidate(&fresh).await;
                        Err(AppError::fetch(format!(
                            "{} period {}: still unauthorized after token refresh",
                            target,
                            period.formatted()
                        )))
                    }
                    other => other,
                }
            }
            other => other,
        }
    }

    async fn send<W>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        token: &str,
        target: &str,
        period: Period,
    ) -> Result<Statement>
    where
        W: DeserializeOwned + Into<Statement>,
    {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .query(query)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                AppError::fetch(format!(
                    "{} period {}: {} ({})",
                    target,
                    period.formatted(),
                    if e.is_timeout() {
                        "timeout"
                    } else {
                        "request failed"
                    },
                    e
                ))
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(AppError::unauthorized(format!(
                "{} period {}",
                target,
                period.formatted()
            )));
        }

        let body = response.text().await.map_err(|e| {
            AppError::fetch(format!(
                "{} period {}: failed to read response ({})",
                target,
                period.formatted(),
                e
            ))
        })?;

        if !status.is_success() {
            return Err(AppError::fetch(format!(
                "{} period {}: HTTP {} ({})",
                target,
                period.formatted(),
                status.as_u16(),
                excerpt(&body)
            )));
        }

        // No statement for the period
        if body.trim().is_empty() {
            return Ok(Statement::default());
        }

        let wire: W = serde_json::from_str(&body).map_err(|e| {
            AppError::fetch(format!(
                "{} period {}: invalid statement body ({})",
                target,
                period.formatted(),
                e
            ))
        })?;

        Ok(wire.into())
    }
}

/// Longest upstream error body copied into an error message
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Trimmed error body, cut at `MAX_ERROR_BODY_CHARS`
fn excerpt(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

/// Prefix a token failure with the statement it was needed for
fn with_subject(err: AppError, target: &str, period: Period) -> AppError {
    let detail = match err {
        AppError::Fetch(message) => message,
        other => other.to_string(),
    };
    AppError::fetch(format!("{} period {}: {}", target, period.formatted(), detail))
}

/// Tokens come back as a raw string, sometimes JSON-quoted
fn normalize_token(body: &str) -> String {
    let trimmed = body.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(trimmed)
        .to_string()
}

#[async_trait]
impl BillingApi for HttpBillingClient {
    async fn fetch_by_document(&self, period: Period, document: &FiscalDocument) -> Result<Statement> {
        let periodo = period.formatted();
        let target = format!("{} {}", document.kind(), document.masked());

        debug!(subject = %target, period = %period, "Fetching statement by document");

        self.get_statement::<CompanyStatementWire>(
            BY_DOCUMENT_PATH,
            &[("periodo", periodo.as_str()), ("cnpj", document.as_str())],
            &target,
            period,
        )
        .await
    }

    async fn fetch_by_contract(&self, period: Period, contract_id: &str) -> Result<Statement> {
        let periodo = period.formatted();
        let target = format!("contract {}", contract_id);

        debug!(subject = %target, period = %period, "Fetching statement by contract");

        self.get_statement::<ContractStatementWire>(
            BY_CONTRACT_PATH,
            &[("periodo", periodo.as_str()), ("contrato", contract_id)],
            &target,
            period,
        )
        .await
    }

    fn name(&self) -> &str {
        "billing-api"
    }
}
