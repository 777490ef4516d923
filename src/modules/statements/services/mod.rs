pub mod billing_api;
pub mod http_billing_client;
pub mod statement_mapper;

pub use billing_api::BillingApi;
pub use http_billing_client::HttpBillingClient;
pub use statement_mapper::StatementMapper;
