//! `skate-api` server binary.

use std::net::SocketAddr;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use skate_api::{create_router, metrics, ApiConfig, AppState};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::from_env();
    info!(
        host = %config.host,
        port = config.port,
        backend = ?config.scoring_backend,
        environment = %config.environment,
        "Starting skate-api"
    );

    let state = match AppState::new(config.clone()).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to create application state: {:#}", e);
            std::process::exit(1);
        }
    };

    let metrics_handle = config.metrics_enabled.then(|| {
        info!("Prometheus metrics enabled at /metrics");
        metrics::init_metrics()
    });

    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid bind address");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    info!("Listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
        }
    })
    .await
    .expect("Server error");

    info!("Server shutdown complete");
}

/// JSON lines when `LOG_FORMAT=json`, colored text otherwise.
fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("skate=info".parse().expect("valid directive"))
        .add_directive("ort=warn".parse().expect("valid directive"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().with_ansi(true).with_target(true)).init();
    }
}
