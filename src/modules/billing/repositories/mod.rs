pub mod billing_row_repository;

pub use billing_row_repository::{BillingRowRepository, MySqlBillingRowRepository};
