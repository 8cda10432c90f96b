//! Service entry point: configuration, tracing, database pool, HTTP server.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reeflog_billing::adapters::http::{billing_router, BillingAppState};
use reeflog_billing::adapters::postgres::{
    PostgresEarningsLedger, PostgresPromoCodeStore, PostgresSubscriptionStore,
};
use reeflog_billing::adapters::stripe::{StripeBillingClient, StripeConfig};
use reeflog_billing::config::AppConfig;
use reeflog_billing::domain::billing::CommissionRate;

/// Health check endpoint for liveness probes.
async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "reeflog-billing",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.server.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        environment = ?config.server.environment,
        test_mode = config.billing.is_test_mode(),
        "Starting reeflog-billing"
    );

    // Database pool
    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    // Wire adapters into the shared state
    let commission_rate = CommissionRate::new(config.billing.commission_rate)
        .map_err(|e| format!("invalid commission rate: {}", e))?;

    let state = BillingAppState {
        subscriptions: Arc::new(PostgresSubscriptionStore::new(pool.clone())),
        promo_codes: Arc::new(PostgresPromoCodeStore::new(pool.clone())),
        ledger: Arc::new(PostgresEarningsLedger::new(pool)),
        billing_provider: Arc::new(StripeBillingClient::new(StripeConfig::new(
            config.billing.stripe_api_key.clone(),
        ))),
        webhook_secret: config.billing.stripe_webhook_secret.clone(),
        commission_rate,
        admin_token: config.billing.admin_token.clone(),
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .nest("/api", billing_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )));

    let addr = config.server.socket_addr();
    tracing::info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
