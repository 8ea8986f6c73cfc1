use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seatgrid::{
    config::Config, controllers, database::Database, services::reclaimer::ExpiryReclaimer,
    AppState,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(environment = %config.app.environment, "Starting seatgrid booking engine");

    // Connect to the database
    let db = Database::new(&config.database.url, config.database.pool_size)
        .await
        .expect("Failed to connect to database");
    info!("Database connected");

    // Run migrations
    db.run_migrations().await.expect("Failed to run migrations");

    // Create the shared application state
    let app_state = Arc::new(AppState {
        db: db.clone(),
        config: config.clone(),
    });

    // --- Start background tasks ---

    // Sweep expired holds back to AVAILABLE on a fixed interval
    let reclaimer = ExpiryReclaimer::new(db.clone());
    let interval = Duration::from_secs(config.holds.reclaim_interval_seconds);
    task::spawn(async move {
        loop {
            if let Err(e) = reclaimer.reclaim_expired().await {
                error!("expiry reclaim failed: {:?}", e);
            }
            tokio::time::sleep(interval).await;
        }
    });

    // --- Start the web server ---

    let app = Router::new()
        .route("/", get(|| async { "seatgrid API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(app_state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.app.host, config.app.port)
        .parse()
        .expect("HOST/PORT must form a valid socket address");
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app.into_make_service())
        .await
        .expect("Server error");
}
