pub mod billing_row;

pub use billing_row::{BillingRow, BucketKey, ImportSource};
