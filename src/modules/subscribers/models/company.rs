use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use crate::core::{FiscalDocument, Result};

/// ERP identifiers that place a company in the billing rows table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
pub struct CompanyKey {
    pub company_code: i32,
    /// Affiliate group
    pub group_code: i32,
    pub branch_code: i32,
    /// Distribution channel
    pub channel_code: i32,
}

impl CompanyKey {
    pub fn new(company_code: i32, group_code: i32, branch_code: i32, channel_code: i32) -> Self {
        Self {
            company_code,
            group_code,
            branch_code,
            channel_code,
        }
    }
}

impl fmt::Display for CompanyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.company_code, self.group_code, self.branch_code, self.channel_code
        )
    }
}

/// A subscriber read from the registry. The pipeline never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Company {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub key: CompanyKey,

    pub name: String,

    /// Fiscal document as registered; may be a CPF for sole proprietors
    pub document: String,

    /// Whether the company takes part in the monthly sync
    pub syncing: bool,
}

impl Company {
    /// Validate the registered document, detecting CPF or CNPJ
    pub fn fiscal_document(&self) -> Result<FiscalDocument> {
        FiscalDocument::parse(&self.document)
    }
}
