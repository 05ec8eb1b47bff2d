//! HTTP boundary: routing, CORS, host allowlisting and rate limiting around
//! the transcript service.

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod middleware;
pub mod rate_limit;
pub mod routes;

use crate::config::{Config, SecurityConfig};
use crate::service::TranscriptService;
use middleware::{HostAllowlist, RouteLimit};
use rate_limit::RateLimiter;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub service: TranscriptService,
}

/// Build the application router
pub fn build_router(service: TranscriptService, config: &Config) -> Router {
    let limiter = Arc::new(RateLimiter::new(Duration::from_secs(
        config.limits.rate_window_secs.max(1),
    )));
    let rates = &config.limits.rate_limits;
    let budget = |route: &'static str, limit: u32| RouteLimit {
        limiter: Arc::clone(&limiter),
        route,
        limit,
    };

    let allowlist = Arc::new(HostAllowlist::new(&config.security.allowed_hosts));

    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .route(
            "/transcript/batch",
            post(routes::post_batch).layer(from_fn_with_state(
                budget("batch", rates.batch),
                middleware::rate_limit,
            )),
        )
        .route(
            "/transcript/:video_id",
            get(routes::get_transcript).layer(from_fn_with_state(
                budget("transcript", rates.transcript),
                middleware::rate_limit,
            )),
        )
        .route(
            "/transcript/:video_id/languages",
            get(routes::get_languages).layer(from_fn_with_state(
                budget("languages", rates.languages),
                middleware::rate_limit,
            )),
        )
        .with_state(AppState { service })
        .layer(cors_layer(&config.security))
        .layer(from_fn_with_state(allowlist, middleware::check_host))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if security.cors_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

/// Bind the configured address and serve until Ctrl-C
pub async fn serve(config: &Config, service: TranscriptService) -> Result<()> {
    let address = config.bind_address();
    let app = build_router(service, config);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
