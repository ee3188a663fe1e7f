use axum::http::{HeaderValue, Method};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tictactoe::session::spawn_cleanup_task;
use tictactoe::{router, AppConfig, AppState, EventBus, SessionRegistry};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tictactoe=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tic-tac-toe server");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return;
        }
    };
    let cors = match build_cors(&config.allowed_origins) {
        Ok(cors) => cors,
        Err(e) => {
            error!(error = %e, "Invalid allowed origin");
            return;
        }
    };

    let registry = Arc::new(SessionRegistry::new(config.cleanup.session_timeout));
    let event_bus = EventBus::new();
    let app_state = AppState::new(
        Arc::clone(&registry),
        event_bus.clone(),
        config.connection.clone(),
    );

    let shutdown = CancellationToken::new();
    let cleanup_handle = spawn_cleanup_task(
        registry,
        event_bus,
        config.cleanup.cleanup_interval,
        shutdown.clone(),
    );

    let app = router(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.bind_addr, error = %e, "Failed to bind");
            return;
        }
    };
    info!("Server running on http://{}", config.bind_addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %e, "Server error");
    }

    shutdown.cancel();
    if let Err(e) = cleanup_handle.await {
        error!(error = %e, "Cleanup task panicked");
    }
    info!("Server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}

fn build_cors(origins: &[String]) -> Result<CorsLayer, axum::http::header::InvalidHeaderValue> {
    if origins.iter().any(|o| o == "*") {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any));
    }

    let origins = origins
        .iter()
        .map(|origin| HeaderValue::from_str(origin))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any))
}
