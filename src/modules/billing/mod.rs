pub mod models;
pub mod repositories;

pub use models::{BillingRow, BucketKey, ImportSource};
pub use repositories::{BillingRowRepository, MySqlBillingRowRepository};
