pub mod billing;
pub mod health;
pub mod imports;
pub mod statements;
pub mod subscribers;
pub mod tokens;
