pub mod models;
pub mod repositories;

pub use models::{Company, CompanyKey, Contract};
pub use repositories::{MySqlSubscriberRepository, SubscriberRepository};
