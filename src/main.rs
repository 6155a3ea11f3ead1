mod app_state;
mod config;
mod models;
mod routes;
mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::response::Html;
use axum::{routing::delete, routing::get, routing::post, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use app_state::AppState;
use config::AppConfig;
use services::{
    enhance::{Enhancer, PollConfig},
    history::GalleryStore,
    remote::PicwishClient,
    stats::StatsStore,
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing image-enhancer gateway");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_counter!(
        "enhancement_jobs_total",
        "Total enhancement tasks submitted to the remote service"
    );
    metrics::describe_counter!(
        "enhancement_jobs_completed",
        "Total enhancement tasks that returned an enhanced image"
    );
    metrics::describe_counter!(
        "enhancement_jobs_failed",
        "Total enhancement tasks that failed or timed out"
    );
    metrics::describe_counter!(
        "enhancement_poll_attempts_total",
        "Total status queries issued against the remote service"
    );
    metrics::describe_histogram!(
        "enhancement_duration_seconds",
        "Wall-clock time from upload to terminal task state"
    );

    // Initialize the remote enhancement client and poller
    tracing::info!(base_url = %config.enhance_base_url, "Initializing enhancement client");
    let client = PicwishClient::new(&config.enhance_base_url, &config.enhance_api_key);
    let enhancer = Enhancer::new(
        Arc::new(client),
        PollConfig {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_attempts: config.max_poll_attempts,
        },
    );

    // Initialize the gallery and stats stores
    tracing::info!(data_dir = %config.data_dir, "Opening local stores");
    tokio::fs::create_dir_all(&config.data_dir)
        .await
        .expect("Failed to create data directory");

    let gallery = GalleryStore::load(format!("{}/gallery.json", config.data_dir))
        .await
        .expect("Failed to open gallery store");
    let stats = StatsStore::load(format!("{}/stats.json", config.data_dir))
        .await
        .expect("Failed to open stats store");

    // Create shared application state
    let state = AppState::new(enhancer, gallery, stats);

    // Build API routes
    let app = Router::new()
        // Static UI (embedded at compile time)
        .route("/", get(|| async { Html(include_str!("../static/index.html")) }))
        // API endpoints
        .route("/health", get(routes::health::health_check))
        .route("/api/v1/enhance", post(routes::enhance::enhance_image))
        .route(
            "/api/v1/gallery",
            get(routes::gallery::list_gallery).delete(routes::gallery::clear_gallery),
        )
        .route("/api/v1/gallery/{id}", delete(routes::gallery::delete_entry))
        .route("/api/v1/stats", get(routes::stats::usage_stats))
        .with_state(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(10 * 1024 * 1024)); // 10 MB limit

    tracing::info!("Starting image-enhancer on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
