use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::Period;
use crate::modules::subscribers::CompanyKey;

/// Which traversal produced a row.
///
/// Part of the bucket key: the company and contract imports are additive,
/// and each one only ever replaces its own rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ImportSource {
    /// Statement fetched by the company's fiscal document
    Document,
    /// Statement fetched by contract id
    Contract { contract_id: String },
}

impl ImportSource {
    /// Value of the `source` column
    pub fn kind(&self) -> &'static str {
        match self {
            ImportSource::Document => "document",
            ImportSource::Contract { .. } => "contract",
        }
    }

    /// Value of the `contract_key` column; empty for document imports
    pub fn contract_key(&self) -> &str {
        match self {
            ImportSource::Document => "",
            ImportSource::Contract { contract_id } => contract_id,
        }
    }
}

/// The unit an import replaces: delete everything under the key, then insert
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketKey {
    pub company: CompanyKey,
    pub import_period: Period,
    pub source: ImportSource,
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.company, self.import_period, self.source.kind())?;
        if let ImportSource::Contract { contract_id } = &self.source {
            write!(f, " {}", contract_id)?;
        }
        Ok(())
    }
}

/// One beneficiary-level billing line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingRow {
    pub company: CompanyKey,
    pub source: ImportSource,

    // Invoice-level fields, shared by every row of the same invoice
    pub contract: String,
    pub plan: String,
    pub coverage: String,
    pub invoice_code: String,
    pub invoice_total: Decimal,

    pub beneficiary_code: String,
    pub beneficiary_name: String,
    pub beneficiary_document: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub admission_date: Option<NaiveDate>,
    /// Code of the primary beneficiary; `None` for the primary themself
    pub holder_code: Option<String>,
    pub age: Option<i32>,
    pub amount: Decimal,
    /// Upper-cased, without diacritics
    pub description: String,

    /// Month actually requested from the provider
    pub import_period: Period,
    /// Month the amount is attributed to
    pub reference_period: Period,
}

impl BillingRow {
    pub fn is_dependent(&self) -> bool {
        self.holder_code.is_some()
    }

    pub fn bucket_key(&self) -> BucketKey {
        BucketKey {
            company: self.company.clone(),
            import_period: self.import_period,
            source: self.source.clone(),
        }
    }
}
