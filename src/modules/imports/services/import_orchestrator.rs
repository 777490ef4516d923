use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tracing::{error, info, info_span, warn, Instrument};

use crate::core::{CancellationFlag, FiscalDocument, Period, Result};
use crate::modules::billing::models::{BucketKey, ImportSource};
use crate::modules::billing::repositories::BillingRowRepository;
use crate::modules::imports::models::{ImportKind, ImportResult};
use crate::modules::statements::services::{BillingApi, StatementMapper};
use crate::modules::subscribers::models::{Company, Contract};
use crate::modules::subscribers::repositories::SubscriberRepository;

/// Replaces each subscriber's billing rows for a period with the provider's
/// current statement.
///
/// Per entity the steps are strictly ordered: delete the bucket, fetch,
/// map, insert. A failing entity is recorded and the run moves on.
pub struct ImportOrchestrator {
    subscribers: Arc<dyn SubscriberRepository>,
    rows: Arc<dyn BillingRowRepository>,
    api: Arc<dyn BillingApi>,
    concurrency: usize,
}

/// Something a run imports
enum ImportEntity {
    Company(Company),
    Contract(Contract),
}

enum FetchTarget<'a> {
    Document(FiscalDocument),
    Contract(&'a str),
}

enum EntityOutcome {
    Imported { deleted: u64, inserted: u64 },
    Failed(String),
    Skipped,
}

impl ImportEntity {
    fn label(&self) -> String {
        match self {
            ImportEntity::Company(company) => format!("company {}", company.key),
            ImportEntity::Contract(contract) => format!("contract {}", contract.contract_id),
        }
    }

    fn bucket(&self, period: Period) -> BucketKey {
        match self {
            ImportEntity::Company(company) => BucketKey {
                company: company.key.clone(),
                import_period: period,
                source: ImportSource::Document,
            },
            ImportEntity::Contract(contract) => BucketKey {
                company: contract.key.clone(),
                import_period: period,
                source: ImportSource::Contract {
                    contract_id: contract.contract_id.clone(),
                },
            },
        }
    }
}

impl ImportOrchestrator {
    pub fn new(
        subscribers: Arc<dyn SubscriberRepository>,
        rows: Arc<dyn BillingRowRepository>,
        api: Arc<dyn BillingApi>,
    ) -> Self {
        Self {
            subscribers,
            rows,
            api,
            concurrency: 1,
        }
    }

    /// Process up to `concurrency` entities at once (minimum 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Import every syncing company by fiscal document
    pub async fn run(&self, period: Period) -> ImportResult {
        self.run_with(ImportKind::Companies, period, &CancellationFlag::new())
            .await
    }

    /// Import every active contract by contract id
    pub async fn run_contracts(&self, period: Period) -> ImportResult {
        self.run_with(ImportKind::Contracts, period, &CancellationFlag::new())
            .await
    }

    /// Run one traversal. `cancel` is checked before each entity starts.
    pub async fn run_with(
        &self,
        kind: ImportKind,
        period: Period,
        cancel: &CancellationFlag,
    ) -> ImportResult {
        let mut result = ImportResult::new(kind, period);
        let span = info_span!("billing_import", run_id = %result.run_id, kind = %kind, period = %period);

        async {
            let entities = match self.load_entities(kind).await {
                Ok(entities) => entities,
                Err(e) => {
                    error!(error = %e, "Failed to load subscribers");
                    result.errors.push(format!("subscriber registry: {}", e));
                    return;
                }
            };

            if entities.is_empty() {
                warn!("No subscribers flagged for billing sync");
                result
                    .errors
                    .push(format!("no {} flagged for billing sync", kind));
                return;
            }

            result.subscribers_total = entities.len();
            info!(entities = entities.len(), "Starting billing import");

            let mut outcomes: Vec<(usize, String, EntityOutcome)> =
                stream::iter(entities.into_iter().enumerate().map(|(index, entity)| async move {
                    let label = entity.label();
                    if cancel.is_cancelled() {
                        return (index, label, EntityOutcome::Skipped);
                    }
                    let outcome = match self.import_entity(&entity, period).await {
                        Ok((deleted, inserted)) => EntityOutcome::Imported { deleted, inserted },
                        Err(e) => EntityOutcome::Failed(e.to_string()),
                    };
                    (index, label, outcome)
                }))
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

            // Completion order varies with concurrency; report in entity order
            outcomes.sort_by_key(|(index, _, _)| *index);

            for (_, label, outcome) in outcomes {
                match outcome {
                    EntityOutcome::Imported { deleted, inserted } => {
                        result.subscribers_processed += 1;
                        result.rows_deleted += deleted;
                        result.rows_imported += inserted;
                    }
                    EntityOutcome::Failed(message) => {
                        result.errors.push(format!("{}: {}", label, message));
                    }
                    EntityOutcome::Skipped => {
                        result.skipped += 1;
                    }
                }
            }
            result.cancelled = result.skipped > 0;

            info!(
                processed = result.subscribers_processed,
                total = result.subscribers_total,
                rows = result.rows_imported,
                errors = result.errors.len(),
                skipped = result.skipped,
                "Billing import finished"
            );
        }
        .instrument(span)
        .await;

        result.finish()
    }

    async fn load_entities(&self, kind: ImportKind) -> Result<Vec<ImportEntity>> {
        Ok(match kind {
            ImportKind::Companies => self
                .subscribers
                .list_syncing_companies()
                .await?
                .into_iter()
                .map(ImportEntity::Company)
                .collect(),
            ImportKind::Contracts => self
                .subscribers
                .list_active_contracts()
                .await?
                .into_iter()
                .map(ImportEntity::Contract)
                .collect(),
        })
    }

    /// Replace one entity's bucket, returning (deleted, inserted)
    async fn import_entity(&self, entity: &ImportEntity, period: Period) -> Result<(u64, u64)> {
        let label = entity.label();

        let result = self.replace_bucket(entity, period).await;

        match &result {
            Ok((deleted, inserted)) => {
                info!(entity = %label, deleted, inserted, "Billing rows replaced")
            }
            Err(e) => warn!(entity = %label, error = %e, "Billing import failed for entity"),
        }

        result
    }

    async fn replace_bucket(&self, entity: &ImportEntity, period: Period) -> Result<(u64, u64)> {
        let bucket = entity.bucket(period);

        // Resolved before touching the bucket so a bad registry entry keeps its old rows
        let target = match entity {
            ImportEntity::Company(company) => FetchTarget::Document(company.fiscal_document()?),
            ImportEntity::Contract(contract) => FetchTarget::Contract(&contract.contract_id),
        };

        let deleted = self.rows.delete_bucket(&bucket).await?;

        let statement = match &target {
            FetchTarget::Document(document) => self.api.fetch_by_document(period, document).await?,
            FetchTarget::Contract(contract_id) => {
                self.api.fetch_by_contract(period, contract_id).await?
            }
        };

        let rows = StatementMapper::flatten(&statement, &bucket.company, period, &bucket.source);
        let inserted = self.rows.insert_rows(&rows).await?;

        Ok((deleted, inserted))
    }
}
