pub mod aggregation_service;
pub mod import_orchestrator;

pub use aggregation_service::AggregationService;
pub use import_orchestrator::ImportOrchestrator;
