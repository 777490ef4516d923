use actix_web::{web, HttpResponse};
use tracing::info;

use crate::core::{CancellationFlag, Result};
use crate::modules::imports::models::{ImportKind, ImportRequest};
use crate::modules::imports::services::{AggregationService, ImportOrchestrator};

/// POST /api/imports/companies
///
/// Imports every syncing company for `{month, year}`. Always 200 once the
/// period is valid; per-company failures are listed in `errors`.
pub async fn import_companies(
    orchestrator: web::Data<ImportOrchestrator>,
    cancel: web::Data<CancellationFlag>,
    body: web::Json<ImportRequest>,
) -> Result<HttpResponse> {
    run_import(orchestrator, cancel, ImportKind::Companies, body.into_inner()).await
}

/// POST /api/imports/contracts
pub async fn import_contracts(
    orchestrator: web::Data<ImportOrchestrator>,
    cancel: web::Data<CancellationFlag>,
    body: web::Json<ImportRequest>,
) -> Result<HttpResponse> {
    run_import(orchestrator, cancel, ImportKind::Contracts, body.into_inner()).await
}

async fn run_import(
    orchestrator: web::Data<ImportOrchestrator>,
    cancel: web::Data<CancellationFlag>,
    kind: ImportKind,
    request: ImportRequest,
) -> Result<HttpResponse> {
    let period = request.period()?;
    info!(kind = %kind, period = %period, "Import requested");

    let result = orchestrator.run_with(kind, period, cancel.get_ref()).await;
    Ok(HttpResponse::Ok().json(result))
}

/// POST /api/imports/aggregate
///
/// Runs the downstream aggregation for the reference period of `{month, year}`
pub async fn aggregate(
    service: web::Data<AggregationService>,
    body: web::Json<ImportRequest>,
) -> Result<HttpResponse> {
    let period = body.period()?;
    let result = service.aggregate(period).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Configure import routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/imports")
            .route("/companies", web::post().to(import_companies))
            .route("/contracts", web::post().to(import_contracts))
            .route("/aggregate", web::post().to(aggregate)),
    );
}
