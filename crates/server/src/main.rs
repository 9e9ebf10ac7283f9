//! Grievance-rs server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware};
use grievance_api::{AppState, RateLimiterState, rate_limit::limits};
use grievance_common::{Config, SystemClock};
use grievance_core::services::notification;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grievance=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting grievance-rs server...");

    let config = Config::load()?;

    let db = grievance_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    grievance_db::migrate(&db).await?;
    info!("Migrations completed");

    let notifier = notification::from_config(&config.notification)?;
    info!(provider = ?config.notification.provider, "Initialized notification sender");

    let state = AppState::build(Arc::new(db), &config, notifier, Arc::new(SystemClock));

    let provisioned = state.officer_service.provision(&config.officers).await?;
    info!(
        configured = config.officers.len(),
        provisioned, "Officer bootstrap completed"
    );

    let rate_limiter = RateLimiterState::new(limits::AUTH)
        .trust_proxy_headers(config.server.trust_proxy_headers);
    let cleanup_limiter = rate_limiter.clone();
    tokio::spawn(async move {
        let window = cleanup_limiter.config.window_secs;
        let mut interval = tokio::time::interval(Duration::from_secs(window.max(1)));
        loop {
            interval.tick().await;
            cleanup_limiter.limiter.cleanup(window).await;
        }
    });

    let app = Router::new()
        .merge(grievance_api::router(rate_limiter))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            grievance_api::middleware::auth_middleware,
        ))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shutdown complete");
    Ok(())
}
