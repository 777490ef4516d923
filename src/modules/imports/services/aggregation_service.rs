use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use crate::core::{Period, Result};
use crate::modules::imports::models::AggregationResult;
use crate::modules::imports::repositories::AggregationRepository;

/// Triggers the downstream aggregation for an imported period
pub struct AggregationService {
    repository: Arc<dyn AggregationRepository>,
}

impl AggregationService {
    pub fn new(repository: Arc<dyn AggregationRepository>) -> Self {
        Self { repository }
    }

    /// Aggregate the reference period of `import_period`
    pub async fn aggregate(&self, import_period: Period) -> Result<AggregationResult> {
        let reference_period = import_period.reference_period();
        let started_at = Utc::now();

        info!(
            import_period = %import_period,
            reference_period = %reference_period,
            "Running billing aggregation"
        );

        if let Err(e) = self.repository.aggregate(reference_period).await {
            error!(reference_period = %reference_period, error = %e, "Billing aggregation failed");
            return Err(e);
        }

        Ok(AggregationResult {
            import_period,
            reference_period,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
