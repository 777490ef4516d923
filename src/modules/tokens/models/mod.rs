pub mod cached_token;

pub use cached_token::CachedToken;
