pub mod subscriber_repository;

pub use subscriber_repository::{MySqlSubscriberRepository, SubscriberRepository};
