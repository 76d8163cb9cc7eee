//! HTTP server implementation using Axum.

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use guichet_core::config::GatewayConfig;
use guichet_core::traits::Strategy;
use guichet_index::RetrievalIndex;

/// Shared state for the gateway server. The strategy is bound once at
/// startup; switching strategies means restarting the service.
#[derive(Clone)]
pub struct AppState {
    pub strategy: Arc<dyn Strategy>,
    pub index: Arc<RetrievalIndex>,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    build_router_from_arc(Arc::new(state))
}

pub fn build_router_from_arc(shared: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_origin(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/api/v1/answer", post(super::routes::answer))
        .route("/api/v1/faq", get(super::routes::list_faq))
        .route("/api/v1/faq/{id}", get(super::routes::get_faq_entry))
        .route("/health", get(super::routes::health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Start the HTTP server. Runs until ctrl-c.
pub async fn start(config: &GatewayConfig, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🌐 Guichet gateway listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => tracing::warn!("⚠️ could not listen for shutdown signal: {e}"),
    }
}
