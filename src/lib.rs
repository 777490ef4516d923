//! HealthSync billing synchronization library
//!
//! Imports per-company health-plan billing statements from the provider's
//! API into the local store, one month at a time.

pub mod config;
pub mod core;
pub mod modules;

// Re-export commonly used types
pub use modules::billing;
pub use modules::imports;
pub use modules::statements;
pub use modules::subscribers;
pub use modules::tokens;
