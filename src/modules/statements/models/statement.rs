use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical monthly statement: invoices, each with its beneficiary charges.
/// Both provider response shapes are converted into this before flattening.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub invoices: Vec<StatementInvoice>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementInvoice {
    pub contract: String,
    pub plan: String,
    pub coverage: String,
    pub invoice_code: String,
    pub invoice_total: Decimal,
    pub compositions: Vec<Composition>,
}

/// One beneficiary charge inside an invoice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub beneficiary_code: String,
    pub beneficiary_name: String,
    pub beneficiary_document: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub admission_date: Option<NaiveDate>,
    /// Raw dependency field: blank for the primary beneficiary, otherwise
    /// the primary's code
    pub dependency: String,
    pub age: Option<i32>,
    pub amount: Decimal,
    pub description: String,
}

impl Statement {
    pub fn composition_count(&self) -> usize {
        self.invoices.iter().map(|i| i.compositions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.composition_count() == 0
    }
}
