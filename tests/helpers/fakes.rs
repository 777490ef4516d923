use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use healthsync::core::{AppError, CancellationFlag, Clock, FiscalDocument, Period, Result};
use healthsync::modules::billing::{BillingRow, BillingRowRepository, BucketKey};
use healthsync::modules::statements::{BillingApi, Statement};
use healthsync::modules::subscribers::{Company, Contract, SubscriberRepository};
use healthsync::modules::tokens::{CachedToken, TokenRepository};

/// Clock that only moves when told to
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn starting_now() -> Self {
        Self::new(Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap())
    }

    pub fn now_minus(&self, by: Duration) -> DateTime<Utc> {
        *self.now.lock().unwrap() - by
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Subscriber registry backed by vectors
#[derive(Default)]
pub struct InMemorySubscribers {
    pub companies: Mutex<Vec<Company>>,
    pub contracts: Mutex<Vec<Contract>>,
    pub fail: AtomicBool,
}

impl InMemorySubscribers {
    pub fn with_companies(companies: Vec<Company>) -> Self {
        Self {
            companies: Mutex::new(companies),
            ..Default::default()
        }
    }

    pub fn with_contracts(contracts: Vec<Contract>) -> Self {
        Self {
            contracts: Mutex::new(contracts),
            ..Default::default()
        }
    }
}

#[async_trait]
impl SubscriberRepository for InMemorySubscribers {
    async fn list_syncing_companies(&self) -> Result<Vec<Company>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::internal("registry unavailable"));
        }
        Ok(self
            .companies
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.syncing)
            .cloned()
            .collect())
    }

    async fn list_active_contracts(&self) -> Result<Vec<Contract>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::internal("registry unavailable"));
        }
        Ok(self
            .contracts
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.active)
            .cloned()
            .collect())
    }
}

/// Billing rows store with per-company insert failures
#[derive(Default)]
pub struct InMemoryBillingRows {
    rows: Mutex<Vec<BillingRow>>,
    failing_companies: Mutex<HashSet<i32>>,
    /// "delete <company>" / "insert <company>" in call order
    pub events: Mutex<Vec<String>>,
}

impl InMemoryBillingRows {
    pub fn seed(&self, rows: Vec<BillingRow>) {
        self.rows.lock().unwrap().extend(rows);
    }

    pub fn fail_inserts_for(&self, company_code: i32) {
        self.failing_companies.lock().unwrap().insert(company_code);
    }

    pub fn rows_in(&self, key: &BucketKey) -> Vec<BillingRow> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| &r.bucket_key() == key)
            .cloned()
            .collect()
    }

    pub fn all_rows(&self) -> Vec<BillingRow> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl BillingRowRepository for InMemoryBillingRows {
    async fn delete_bucket(&self, key: &BucketKey) -> Result<u64> {
        self.events
            .lock()
            .unwrap()
            .push(format!("delete {}", key.company.company_code));

        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| &r.bucket_key() != key);
        Ok((before - rows.len()) as u64)
    }

    async fn insert_rows(&self, rows: &[BillingRow]) -> Result<u64> {
        if let Some(first) = rows.first() {
            self.events
                .lock()
                .unwrap()
                .push(format!("insert {}", first.company.company_code));
        }

        let failing = self.failing_companies.lock().unwrap();
        if rows.iter().any(|r| failing.contains(&r.company.company_code)) {
            return Err(AppError::internal("insert rejected"));
        }

        self.rows.lock().unwrap().extend(rows.iter().cloned());
        Ok(rows.len() as u64)
    }

    async fn count_bucket(&self, key: &BucketKey) -> Result<u64> {
        Ok(self.rows_in(key).len() as u64)
    }
}

/// Token table with switchable failures
#[derive(Default)]
pub struct InMemoryTokens {
    rows: Mutex<HashMap<String, CachedToken>>,
    pub upserts: AtomicUsize,
    pub loads: AtomicUsize,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl InMemoryTokens {
    pub fn seed(&self, token: CachedToken) {
        self.rows.lock().unwrap().insert(token.slot.clone(), token);
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn stored(&self, slot: &str) -> Option<CachedToken> {
        self.rows.lock().unwrap().get(slot).cloned()
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokens {
    async fn load(&self, slot: &str) -> Result<Option<CachedToken>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::internal("token table unavailable"));
        }
        Ok(self.rows.lock().unwrap().get(slot).cloned())
    }

    async fn upsert(&self, slot: &str, token: &str, issued_at: DateTime<Utc>) -> Result<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::internal("token table unavailable"));
        }
        self.rows
            .lock()
            .unwrap()
            .insert(slot.to_string(), CachedToken::new(slot, token, issued_at));
        Ok(())
    }
}

/// Canned provider answer
#[derive(Clone)]
pub enum Scripted {
    Statement(Statement),
    Fail(String),
}

/// Billing API that answers from a script. Unscripted subjects get an
/// empty statement.
#[derive(Default)]
pub struct ScriptedBillingApi {
    by_document: Mutex<HashMap<String, Scripted>>,
    by_contract: Mutex<HashMap<String, Scripted>>,
    /// "document <digits>" / "contract <id>" in call order
    pub calls: Mutex<Vec<String>>,
    delay: Option<StdDuration>,
    cancel_on_fetch: Option<CancellationFlag>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl ScriptedBillingApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every fetch open for `delay`
    pub fn with_delay(mut self, delay: StdDuration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Trip `flag` as soon as any fetch starts
    pub fn cancelling(mut self, flag: CancellationFlag) -> Self {
        self.cancel_on_fetch = Some(flag);
        self
    }

    pub fn on_document(&self, document: &str, answer: Scripted) {
        self.by_document
            .lock()
            .unwrap()
            .insert(document.to_string(), answer);
    }

    pub fn on_contract(&self, contract_id: &str, answer: Scripted) {
        self.by_contract
            .lock()
            .unwrap()
            .insert(contract_id.to_string(), answer);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    async fn answer(&self, call: String, scripted: Option<Scripted>) -> Result<Statement> {
        self.calls.lock().unwrap().push(call);
        if let Some(flag) = &self.cancel_on_fetch {
            flag.cancel();
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match scripted {
            Some(Scripted::Statement(statement)) => Ok(statement),
            Some(Scripted::Fail(message)) => Err(AppError::fetch(message)),
            None => Ok(Statement::default()),
        }
    }
}

#[async_trait]
impl BillingApi for ScriptedBillingApi {
    async fn fetch_by_document(&self, _period: Period, document: &FiscalDocument) -> Result<Statement> {
        let scripted = self.by_document.lock().unwrap().get(document.as_str()).cloned();
        self.answer(format!("document {}", document.as_str()), scripted)
            .await
    }

    async fn fetch_by_contract(&self, _period: Period, contract_id: &str) -> Result<Statement> {
        let scripted = self.by_contract.lock().unwrap().get(contract_id).cloned();
        self.answer(format!("contract {}", contract_id), scripted)
            .await
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
