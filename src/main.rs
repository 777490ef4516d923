use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use chrono::Duration;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use healthsync::config::Config;
use healthsync::core::{CancellationFlag, SystemClock};
use healthsync::modules::billing::MySqlBillingRowRepository;
use healthsync::modules::imports::{
    self, AggregationService, ImportOrchestrator, MySqlAggregationRepository,
};
use healthsync::modules::statements::HttpBillingClient;
use healthsync::modules::subscribers::MySqlSubscriberRepository;
use healthsync::modules::tokens::{MySqlTokenRepository, TokenCache};
use healthsync::modules::health;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "healthsync=debug,actix_web=info".into());
    if config.app.log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting HealthSync billing synchronization");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!("Billing API: {}", config.billing_api.base_url);

    // Create database connection pool
    let db_pool = config
        .database
        .create_pool()
        .await
        .context("Failed to create database pool")?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!(
        "Database pool initialized ({} connections)",
        config.database.pool_size
    );

    let tokens = Arc::new(TokenCache::new(
        Arc::new(MySqlTokenRepository::new(db_pool.clone())),
        Arc::new(SystemClock),
        config.billing_api.token_slot.clone(),
        Duration::hours(config.billing_api.token_ttl_hours),
    ));

    let client = HttpBillingClient::new(&config.billing_api, tokens.clone())
        .context("Failed to build billing API client")?;

    let orchestrator = web::Data::new(
        ImportOrchestrator::new(
            Arc::new(MySqlSubscriberRepository::new(db_pool.clone())),
            Arc::new(MySqlBillingRowRepository::new(db_pool.clone())),
            Arc::new(client),
        )
        .with_concurrency(config.import.concurrency),
    );

    let aggregation = web::Data::new(AggregationService::new(Arc::new(
        MySqlAggregationRepository::new(db_pool.clone(), config.import.aggregation_procedure.clone())
            .context("Failed to configure aggregation")?,
    )));

    // Stop starting new entities once shutdown is requested
    let cancel = CancellationFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Shutdown requested, cancelling running imports");
                cancel.cancel();
            }
        });
    }

    let pool_data = web::Data::new(db_pool);
    let tokens_data = web::Data::from(tokens);
    let cancel_data = web::Data::new(cancel);

    // Start HTTP server
    let bind_address = config.server.bind_address();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(pool_data.clone())
            .app_data(tokens_data.clone())
            .app_data(orchestrator.clone())
            .app_data(aggregation.clone())
            .app_data(cancel_data.clone())
            .configure(health::configure)
            .configure(imports::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await?;
    Ok(())
}
