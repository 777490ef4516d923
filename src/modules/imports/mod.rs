pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use controllers::configure;
pub use models::{AggregationResult, ImportKind, ImportRequest, ImportResult};
pub use repositories::{AggregationRepository, MySqlAggregationRepository};
pub use services::{AggregationService, ImportOrchestrator};
