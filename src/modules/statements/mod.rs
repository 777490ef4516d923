pub mod models;
pub mod services;

pub use models::{CompanyStatementWire, Composition, ContractStatementWire, Statement, StatementInvoice};
pub use services::{BillingApi, HttpBillingClient, StatementMapper};
