pub mod models;
pub mod repositories;
pub mod services;

pub use models::CachedToken;
pub use repositories::{MySqlTokenRepository, TokenRepository};
pub use services::TokenCache;
