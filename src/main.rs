mod config;
mod error;
mod handlers;
mod models;
mod storage;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use config::Config;
use handlers::AppState;
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A .env file is optional; the platform usually provides the environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lanternfly=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting lanternfly image service");
    tracing::info!("Storage type: {:?}", config.storage_type);

    // Initialize storage once; every request shares this handle
    let storage = storage::create_storage(&config).await?;
    storage::provision(
        storage.as_ref(),
        &config.container_name,
        config.strict_startup,
    )
    .await?;

    let app = build_router(AppState { storage });

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/v1/upload", post(handlers::upload_image))
        .route("/api/v1/gallery", get(handlers::gallery))
        .route("/files/:name", get(handlers::serve_file))
        .layer(DefaultBodyLimit::max(handlers::MAX_UPLOAD_BODY))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
