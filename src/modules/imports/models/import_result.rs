use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::core::{Period, Result};

/// Which set of entities a run traverses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    /// Syncing companies, fetched by fiscal document
    Companies,
    /// Active contracts, fetched by contract id
    Contracts,
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportKind::Companies => write!(f, "companies"),
            ImportKind::Contracts => write!(f, "contracts"),
        }
    }
}

/// Body of the import and aggregation endpoints
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ImportRequest {
    pub month: u32,
    pub year: i32,
}

impl ImportRequest {
    pub fn period(&self) -> Result<Period> {
        Period::new(self.month, self.year)
    }
}

/// Outcome of one import run. Partial failures are listed in `errors`;
/// the run itself never fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResult {
    pub run_id: Uuid,
    pub kind: ImportKind,
    pub import_period: Period,
    pub reference_period: Period,
    /// Entities found in the syncing set
    pub subscribers_total: usize,
    /// Entities whose rows were replaced successfully
    pub subscribers_processed: usize,
    pub rows_imported: u64,
    pub rows_deleted: u64,
    /// Entities not started because the run was cancelled
    pub skipped: usize,
    pub cancelled: bool,
    /// `entity: error` messages, in entity order
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ImportResult {
    pub fn new(kind: ImportKind, import_period: Period) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            kind,
            import_period,
            reference_period: import_period.reference_period(),
            subscribers_total: 0,
            subscribers_processed: 0,
            rows_imported: 0,
            rows_deleted: 0,
            skipped: 0,
            cancelled: false,
            errors: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }
}

/// Outcome of a downstream aggregation call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationResult {
    pub import_period: Period,
    pub reference_period: Period,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
