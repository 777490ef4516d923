pub mod statement;
pub mod wire;

pub use statement::{Composition, Statement, StatementInvoice};
pub use wire::{CompanyStatementWire, ContractStatementWire};
