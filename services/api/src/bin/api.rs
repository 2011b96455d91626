//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{Argon2Hasher, DbAdapter, FcmGateway, JwtAdapter},
    config::Config,
    error::ApiError,
    web::{router, state::AppState},
};
use solicare_core::ports::PushGateway;
use solicare_core::services::{Services, Stores};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let jwt = Arc::new(JwtAdapter::new(
        &config.jwt_secret,
        config.jwt_expiration_minutes,
    ));
    if config.fcm.is_none() {
        warn!("FCM_PROJECT_ID or FCM_ACCESS_TOKEN is missing; push deliveries will fail");
    }
    let fcm = FcmGateway::new(
        config.fcm_endpoint.clone(),
        config.fcm.clone(),
        config.push_timeout,
    )?;
    let gateways: Vec<Arc<dyn PushGateway>> = vec![Arc::new(fcm)];

    // --- 4. Wire the Services ---
    let stores = Stores {
        identity: db_adapter.clone(),
        care: db_adapter.clone(),
        devices: db_adapter.clone(),
        telemetry: db_adapter.clone(),
        medicine: db_adapter.clone(),
    };
    let services = Services::new(
        stores,
        Arc::new(Argon2Hasher::default()),
        jwt.clone(),
        gateways,
    );

    // --- 5. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        services,
        care: db_adapter,
        jwt,
        config: config.clone(),
    });

    // --- 6. Start the Server ---
    let app = router(app_state);
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
